// src/services/pdf_service.rs
//! Desenho do certificado em PDF (uma página A4 em paisagem).
use crate::{error::AppResult, models::certificate::CertificateData};
use lopdf::{
    content::{Content, Operation},
    dictionary, Document, Object, Stream, StringFormat,
};

const PAGE_WIDTH: f32 = 842.0;
const PAGE_HEIGHT: f32 = 595.0;
// Largura média de um glifo Helvetica, em fração do tamanho da fonte
const AVG_GLYPH_WIDTH: f32 = 0.5;
// Margem horizontal mínima de cada lado
const SIDE_MARGIN: f32 = 40.0;
const MIN_FONT_SIZE: f32 = 8.0;

/// Gera os bytes de um certificado.
pub fn render_certificate(data: &CertificateData) -> AppResult<Vec<u8>> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let regular_id = doc.add_object(font("Helvetica"));
    let bold_id = doc.add_object(font("Helvetica-Bold"));
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => regular_id,
            "F2" => bold_id,
        },
    });

    let date = data.finalized_at.format("%d/%m/%Y").to_string();
    let mut operations = border();
    operations.extend(centered_text("F2", 36.0, 460.0, "CERTIFICADO"));
    operations.extend(centered_text("F1", 16.0, 390.0, "Certificamos que"));
    operations.extend(centered_text("F2", 26.0, 345.0, &data.student_name));
    operations.extend(centered_text("F1", 16.0, 300.0, "concluiu com êxito o workshop"));
    operations.extend(centered_text("F2", 20.0, 262.0, &data.workshop_name));
    operations.extend(centered_text(
        "F1",
        14.0,
        222.0,
        &format!("ministrado por {}, finalizado em {}.", data.professor_name, date),
    ));
    operations.extend(signature_line(&data.professor_name));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
    });

    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "Resources" => resources_id,
        "MediaBox" => vec![0.into(), 0.into(), PAGE_WIDTH.into(), PAGE_HEIGHT.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(
            win_ansi(&format!("Certificado - {}", data.student_name)),
            StringFormat::Literal,
        ),
        "Producer" => Object::string_literal("oficina-api"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);
    doc.compress();

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

fn font(base: &str) -> lopdf::Dictionary {
    dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => base,
        "Encoding" => "WinAnsiEncoding",
    }
}

fn border() -> Vec<Operation> {
    vec![
        Operation::new("q", vec![]),
        Operation::new("w", vec![3.into()]),
        Operation::new("RG", vec![0.15_f32.into(), 0.25_f32.into(), 0.45_f32.into()]),
        Operation::new(
            "re",
            vec![30.into(), 30.into(), (PAGE_WIDTH - 60.0).into(), (PAGE_HEIGHT - 60.0).into()],
        ),
        Operation::new("S", vec![]),
        Operation::new("Q", vec![]),
    ]
}

fn signature_line(professor_name: &str) -> Vec<Operation> {
    let half = 130.0;
    let center = PAGE_WIDTH / 2.0;
    let mut ops = vec![
        Operation::new("w", vec![1.into()]),
        Operation::new("m", vec![(center - half).into(), 130.into()]),
        Operation::new("l", vec![(center + half).into(), 130.into()]),
        Operation::new("S", vec![]),
    ];
    ops.extend(centered_text("F1", 12.0, 112.0, professor_name));
    ops
}

fn centered_text(font: &str, size: f32, y: f32, text: &str) -> Vec<Operation> {
    let encoded = win_ansi(text);
    let size = fit_font_size(encoded.len(), size);
    let width = encoded.len() as f32 * size * AVG_GLYPH_WIDTH;
    let x = ((PAGE_WIDTH - width) / 2.0).max(SIDE_MARGIN);

    vec![
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec![font.into(), size.into()]),
        Operation::new("Td", vec![x.into(), y.into()]),
        Operation::new("Tj", vec![Object::String(encoded, StringFormat::Literal)]),
        Operation::new("ET", vec![]),
    ]
}

/// Reduz a fonte para que a linha caiba entre as margens.
fn fit_font_size(glyphs: usize, size: f32) -> f32 {
    let available = PAGE_WIDTH - 2.0 * SIDE_MARGIN;
    let width = glyphs as f32 * size * AVG_GLYPH_WIDTH;
    if width <= available {
        return size;
    }
    (available / (glyphs as f32 * AVG_GLYPH_WIDTH)).max(MIN_FONT_SIZE)
}

/// Converte para WinAnsiEncoding (CP1252); o que não tem glifo vira '?'.
fn win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        '\u{20}'..='\u{7E}' | '\u{A0}'..='\u{FF}' => c as u8,
        '€' => 0x80,
        '‚' => 0x82,
        'ƒ' => 0x83,
        '„' => 0x84,
        '…' => 0x85,
        '†' => 0x86,
        '‡' => 0x87,
        'ˆ' => 0x88,
        '‰' => 0x89,
        'Š' => 0x8A,
        '‹' => 0x8B,
        'Œ' => 0x8C,
        'Ž' => 0x8E,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '˜' => 0x98,
        '™' => 0x99,
        'š' => 0x9A,
        '›' => 0x9B,
        'œ' => 0x9C,
        'ž' => 0x9E,
        'Ÿ' => 0x9F,
        // Controlos (incluindo U+0080..U+009F) e tudo o resto
        _ => b'?',
    }
}
