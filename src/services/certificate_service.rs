// src/services/certificate_service.rs
use crate::{
    error::{AppError, AppResult},
    models::certificate::{CertificateData, CertificateLink},
    services::pdf_service,
};
use chrono::Utc;
use futures_util::future::try_join_all;
use std::path::{Component, Path, PathBuf};

const CERTIFICATE_EXTENSION: &str = "pdf";

/// Diretório raiz dos certificados: `<root>/workshop_<id>/<ficheiro>.pdf`.
#[derive(Debug, Clone)]
pub struct CertificateStore {
    root: PathBuf,
}

impl CertificateStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn workshop_dir(&self, workshop_id: i64) -> PathBuf {
        self.root.join(format!("workshop_{}", workshop_id))
    }

    /// Gera um certificado por aluno, em paralelo, no diretório do workshop.
    /// Falha se qualquer um falhar; os já escritos ficam no disco.
    pub async fn generate_all(
        &self,
        workshop_id: i64,
        certificates: Vec<CertificateData>,
    ) -> AppResult<Vec<PathBuf>> {
        let paths = render_into(&self.workshop_dir(workshop_id), certificates).await?;
        tracing::info!(
            "📜 {} certificado(s) gerado(s) para o workshop {}",
            paths.len(),
            workshop_id
        );
        Ok(paths)
    }

    /// Substitui todos os certificados do workshop pelo lote dado.
    ///
    /// O lote é escrito num diretório temporário e só depois trocado com o
    /// atual, por isso ficheiros de alunos que saíram do workshop desaparecem
    /// e uma falha a meio deixa os certificados antigos intactos.
    pub async fn replace_all(
        &self,
        workshop_id: i64,
        certificates: Vec<CertificateData>,
    ) -> AppResult<Vec<PathBuf>> {
        let dir = self.workshop_dir(workshop_id);
        let stamp = Utc::now().timestamp_nanos_opt().unwrap_or_default();
        let staging = self.root.join(format!("workshop_{}.novo-{}", workshop_id, stamp));
        let retired = self.root.join(format!("workshop_{}.antigo-{}", workshop_id, stamp));

        let count = match render_into(&staging, certificates).await {
            Ok(paths) => paths.len(),
            Err(e) => {
                remove_dir_quietly(&staging).await;
                return Err(e);
            }
        };

        let had_previous = match tokio::fs::rename(&dir, &retired).await {
            Ok(()) => true,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
            Err(e) => {
                remove_dir_quietly(&staging).await;
                return Err(e.into());
            }
        };
        if let Err(e) = tokio::fs::rename(&staging, &dir).await {
            if had_previous {
                if let Err(restore) = tokio::fs::rename(&retired, &dir).await {
                    tracing::error!("Falha ao repor {}: {}", dir.display(), restore);
                }
            }
            remove_dir_quietly(&staging).await;
            return Err(e.into());
        }
        if had_previous {
            remove_dir_quietly(&retired).await;
        }

        tracing::info!(
            "📜 {} certificado(s) regerado(s) para o workshop {}",
            count,
            workshop_id
        );
        self.list_paths(workshop_id).await
    }

    /// Remove o diretório do workshop (usado para desfazer uma finalização falhada).
    pub async fn discard(&self, workshop_id: i64) {
        let dir = self.workshop_dir(workshop_id);
        if remove_dir_quietly(&dir).await {
            tracing::warn!("Certificados descartados: {}", dir.display());
        }
    }

    async fn list_paths(&self, workshop_id: i64) -> AppResult<Vec<PathBuf>> {
        let dir = self.workshop_dir(workshop_id);
        match self.list(workshop_id).await {
            Ok(names) => Ok(names.into_iter().map(|name| dir.join(name)).collect()),
            Err(AppError::NotFound(_)) => Ok(Vec::new()),
            Err(e) => Err(e),
        }
    }

    /// Nomes dos ficheiros `.pdf` do workshop, por ordem alfabética.
    pub async fn list(&self, workshop_id: i64) -> AppResult<Vec<String>> {
        let dir = self.workshop_dir(workshop_id);
        let mut entries = match tokio::fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AppError::NotFound(
                    "Nenhum certificado encontrado para este workshop.".to_string(),
                ))
            }
            Err(e) => return Err(e.into()),
        };

        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_string) else {
                continue;
            };
            if has_certificate_extension(&name) {
                names.push(name);
            }
        }

        if names.is_empty() {
            return Err(AppError::NotFound("Nenhum certificado disponível.".to_string()));
        }
        names.sort();
        Ok(names)
    }

    /// Caminho de um certificado existente. Recusa nomes que saiam do diretório.
    pub async fn resolve(&self, workshop_id: i64, filename: &str) -> AppResult<PathBuf> {
        validate_file_name(filename)?;

        let path = self.workshop_dir(workshop_id).join(filename);
        match tokio::fs::metadata(&path).await {
            Ok(meta) if meta.is_file() => Ok(path),
            Ok(_) => Err(AppError::NotFound("Certificado não encontrado.".to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound("Certificado não encontrado.".to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }
}

async fn render_into(dir: &Path, certificates: Vec<CertificateData>) -> AppResult<Vec<PathBuf>> {
    tokio::fs::create_dir_all(dir).await?;

    let renders = certificates.into_iter().map(|data| {
        let path = dir.join(certificate_file_name(data.student_id, &data.student_name));
        async move {
            let bytes = tokio::task::spawn_blocking(move || pdf_service::render_certificate(&data))
                .await
                .map_err(|e| {
                    tracing::error!("Erro na task spawn_blocking (render_certificate): {:?}", e);
                    AppError::InternalServerError
                })??;
            tokio::fs::write(&path, bytes).await?;
            tracing::debug!("Certificado escrito: {}", path.display());
            Ok::<_, AppError>(path)
        }
    });

    try_join_all(renders).await
}

/// Remove um diretório; devolve `true` se existia.
async fn remove_dir_quietly(dir: &Path) -> bool {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => true,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => false,
        Err(e) => {
            tracing::error!("Falha ao remover {}: {}", dir.display(), e);
            false
        }
    }
}

/// Nome determinístico: `<nome_do_aluno>_<id>_certificate.pdf`.
pub fn certificate_file_name(student_id: i64, student_name: &str) -> String {
    format!("{}_{}_certificate.{}", slug(student_name), student_id, CERTIFICATE_EXTENSION)
}

/// Mantém letras e dígitos; espaços, '-' e '_' viram '_'; o resto é descartado.
fn slug(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if (c.is_whitespace() || c == '-' || c == '_') && !out.ends_with('_') && !out.is_empty() {
            out.push('_');
        }
    }
    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        "aluno".to_string()
    } else {
        trimmed.to_string()
    }
}

fn has_certificate_extension(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(CERTIFICATE_EXTENSION))
}

fn validate_file_name(filename: &str) -> AppResult<()> {
    let invalid = || AppError::Validation("Nome de arquivo inválido.".to_string());

    if filename.is_empty()
        || filename.len() > 255
        || filename.starts_with('.')
        || filename.contains(['/', '\\', '\0'])
        || !has_certificate_extension(filename)
    {
        return Err(invalid());
    }

    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

/// Monta os links de download a partir da base pública.
pub fn certificate_links(base_url: &str, workshop_id: i64, names: Vec<String>) -> Vec<CertificateLink> {
    names
        .into_iter()
        .map(|name| CertificateLink {
            url: format!(
                "{}/workshops/{}/certificates/{}",
                base_url,
                workshop_id,
                urlencoding::encode(&name)
            ),
            name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(student_id: i64, name: &str) -> CertificateData {
        CertificateData {
            student_id,
            student_name: name.into(),
            workshop_name: "W1".into(),
            professor_name: "Prof".into(),
            finalized_at: Utc::now().naive_utc(),
        }
    }

    #[test]
    fn file_names_are_deterministic_and_flat() {
        assert_eq!(certificate_file_name(5, "Maria da Silva"), "Maria_da_Silva_5_certificate.pdf");
        assert_eq!(certificate_file_name(6, "João - Souza"), "João_Souza_6_certificate.pdf");
        assert_eq!(certificate_file_name(7, "../../etc/passwd"), "etcpasswd_7_certificate.pdf");
        assert_eq!(certificate_file_name(8, "  "), "aluno_8_certificate.pdf");
    }

    #[test]
    fn rejects_traversal_and_foreign_extensions() {
        for bad in ["../x.pdf", "a/b.pdf", "a\\b.pdf", ".hidden.pdf", "notes.txt", "", ".."] {
            assert!(validate_file_name(bad).is_err(), "{bad} deveria ser rejeitado");
        }
        assert!(validate_file_name("Maria_5_certificate.pdf").is_ok());
    }

    #[test]
    fn links_url_encode_the_name() {
        let links = certificate_links("http://localhost:3000", 3, vec!["João_1_certificate.pdf".into()]);
        assert_eq!(
            links[0].url,
            "http://localhost:3000/workshops/3/certificates/Jo%C3%A3o_1_certificate.pdf"
        );
        assert_eq!(links[0].name, "João_1_certificate.pdf");
    }

    #[tokio::test]
    async fn generate_list_resolve() {
        let root = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(root.path());

        assert!(matches!(store.list(1).await, Err(AppError::NotFound(_))));

        let paths = store
            .generate_all(1, vec![data(2, "Bruno"), data(1, "Ana")])
            .await
            .unwrap();
        assert_eq!(paths.len(), 2);

        let names = store.list(1).await.unwrap();
        assert_eq!(names, vec!["Ana_1_certificate.pdf", "Bruno_2_certificate.pdf"]);

        let path = store.resolve(1, "Ana_1_certificate.pdf").await.unwrap();
        assert!(path.starts_with(store.workshop_dir(1)));
        assert!(matches!(
            store.resolve(1, "Carla_3_certificate.pdf").await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            store.resolve(1, "../workshop_2/x.pdf").await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn replace_drops_certificates_missing_from_the_new_batch() {
        let root = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(root.path());

        store
            .generate_all(2, vec![data(2, "Ana"), data(3, "Bia")])
            .await
            .unwrap();
        let paths = store.replace_all(2, vec![data(2, "Ana")]).await.unwrap();
        assert_eq!(paths, vec![store.workshop_dir(2).join("Ana_2_certificate.pdf")]);

        assert_eq!(store.list(2).await.unwrap(), vec!["Ana_2_certificate.pdf"]);
        assert!(matches!(
            store.resolve(2, "Bia_3_certificate.pdf").await,
            Err(AppError::NotFound(_))
        ));

        // Só o diretório do workshop fica na raiz
        let mut entries = std::fs::read_dir(root.path()).unwrap();
        assert_eq!(entries.next().unwrap().unwrap().file_name(), "workshop_2");
        assert!(entries.next().is_none());
    }

    #[tokio::test]
    async fn replace_with_an_empty_batch_leaves_no_certificates() {
        let root = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(root.path());

        store.generate_all(5, vec![data(1, "Ana")]).await.unwrap();
        assert!(store.replace_all(5, Vec::new()).await.unwrap().is_empty());
        assert!(matches!(store.list(5).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn empty_directory_lists_as_not_found_and_discard_removes_it() {
        let root = tempfile::tempdir().unwrap();
        let store = CertificateStore::new(root.path());

        store.generate_all(4, Vec::new()).await.unwrap();
        assert!(store.workshop_dir(4).is_dir());
        assert!(matches!(store.list(4).await, Err(AppError::NotFound(_))));

        store.discard(4).await;
        assert!(!store.workshop_dir(4).exists());
        store.discard(4).await;
    }
}
