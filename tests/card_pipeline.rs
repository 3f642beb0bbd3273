use std::io::Cursor;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use pretty_assertions::assert_eq;
use unity_id::{
    CardExportPipeline, CardSurface, DataUri, DraftRecord, ExportError, Field, MAX_PHOTO_BYTES,
    MemoryBackend, MemoryRecordStore, RecordStore, Section, StudentRecord, TemplateId,
    load_photo, validate,
};

fn jane() -> StudentRecord {
    StudentRecord {
        name: "Jane Doe".to_string(),
        roll_number: "U2022001".to_string(),
        class_division: "Class 1-A".to_string(),
        allergies: vec!["Nuts".to_string()],
        photo: None,
        rack_number: "R-42".to_string(),
        bus_route: "Route 1".to_string(),
        created_at: "2024-01-01T00:00:00Z".to_string(),
    }
}

fn tiny_png_uri() -> String {
    let img = RgbaImage::from_pixel(4, 6, Rgba([200, 30, 30, 255]));
    let mut bytes = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
        .unwrap();
    DataUri::encode("image/png", &bytes)
}

#[tokio::test]
async fn submitted_card_round_trips_through_store_and_export() {
    let mut draft = DraftRecord {
        name: Some("Jane Doe".into()),
        roll_number: Some("U2022001".into()),
        class_division: Some("Class 1-A".into()),
        rack_number: Some("R-42".into()),
        bus_route: Some("Route 1".into()),
        ..DraftRecord::default()
    }
    .submitted_at("2024-01-01T00:00:00Z");
    draft.set_allergy("Nuts", true);
    let record = validate(&draft).unwrap();
    assert_eq!(record, jane());

    let store = MemoryRecordStore::new(MemoryBackend::new());
    store.upsert(record.clone());
    assert_eq!(store.list(), vec![record.clone()]);

    let pipeline = CardExportPipeline::default();
    let surface = pipeline.render(&record, TemplateId::A);
    assert_eq!(surface.texts(Section::Allergies), vec!["Allergies", "Nuts"]);
    assert!(surface.photo_source().is_none());
    assert!(surface.shows_placeholder());

    let png = pipeline.export(surface.clone()).await.unwrap();
    assert!(!png.is_empty());
    let decoded = image::load_from_memory(&png).unwrap();
    let (width, height) = surface.size();
    assert_eq!((decoded.width(), decoded.height()), (width * 2, height * 2));

    assert_eq!(pipeline.download_filename(&record.name), "unity-id-jane-doe.png");
}

#[test]
fn scan_payload_is_stable_and_embedded() {
    let pipeline = CardExportPipeline::default();
    let record = jane();
    let first = pipeline.encode_for_scan(&record);
    let second = pipeline.encode_for_scan(&record.clone());
    assert_eq!(first, second);

    let surface = pipeline.render(&record, TemplateId::C);
    assert_eq!(surface.barcode_payload(), Some(first.as_str()));
}

#[test]
fn empty_allergies_and_missing_photo_degrade_in_every_template() {
    let pipeline = CardExportPipeline::default();
    let mut record = jane();
    record.allergies.clear();
    for template in TemplateId::ALL {
        let surface = pipeline.render(&record, template);
        assert_eq!(surface.template(), Some(template));
        assert!(!surface.has_section(Section::Allergies), "{template}");
        assert!(surface.shows_placeholder(), "{template}");
        assert!(surface.has_section(Section::Barcode), "{template}");
    }
}

#[test]
fn allergies_section_uses_template_title() {
    let pipeline = CardExportPipeline::default();
    let surface = pipeline.render(&jane(), TemplateId::C);
    assert_eq!(
        surface.texts(Section::Allergies),
        vec!["Health Information", "Nuts"]
    );
}

#[test]
fn branding_reaches_header_and_footer() {
    let pipeline = CardExportPipeline::default();
    let surface = pipeline.render(&jane(), TemplateId::B);
    assert!(surface.texts(Section::Header).contains(&"Unity School"));
    assert!(
        surface
            .texts(Section::Footer)
            .contains(&"Unity School, Academic Year 2023-24")
    );
    assert!(surface.texts(Section::Details).contains(&"U2022001 - Class 1-A"));
}

#[tokio::test]
async fn photo_is_drawn_instead_of_placeholder() {
    let pipeline = CardExportPipeline::default();
    let mut record = jane();
    record.photo = Some(tiny_png_uri());
    for template in TemplateId::ALL {
        let surface = pipeline.render(&record, template);
        assert!(!surface.shows_placeholder());
        assert_eq!(surface.photo_source(), record.photo.as_deref());
        let png = pipeline.export(surface).await.unwrap();
        assert!(!png.is_empty());
    }
}

/// A 48x64 grainy portrait, several KB as PNG.
fn grainy_photo_file(dir: &std::path::Path) -> std::path::PathBuf {
    let mut seed = 0x2545_f491_u32;
    let img = RgbImage::from_fn(48, 64, |x, y| {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        let grain = (seed >> 24) as u8 & 0x1f;
        Rgb([
            (x * 4) as u8 + grain,
            (y * 3) as u8 + grain,
            120 + grain,
        ])
    });
    let path = dir.join("portrait.png");
    img.save(&path).unwrap();
    path
}

fn draft_with_photo(photo: String) -> DraftRecord {
    DraftRecord {
        name: Some("Jane Doe".into()),
        roll_number: Some("U2022001".into()),
        class_division: Some("Class 1-A".into()),
        allergies: vec!["Nuts".into()],
        photo: Some(photo),
        rack_number: Some("R-42".into()),
        bus_route: Some("Route 1".into()),
        created_at: None,
    }
    .submitted_at("2024-01-01T00:00:00Z")
}

#[test]
fn raw_photo_too_large_for_scan_code_is_rejected_by_the_form() {
    let dir = tempfile::tempdir().unwrap();
    let path = grainy_photo_file(dir.path());
    let bytes = std::fs::read(&path).unwrap();
    assert!(bytes.len() > 2400, "{} bytes", bytes.len());

    let errors = validate(&draft_with_photo(DataUri::encode("image/png", &bytes))).unwrap_err();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].field, Field::Photo);
}

#[tokio::test]
async fn loaded_photo_of_a_few_kb_exports_in_every_template() {
    let dir = tempfile::tempdir().unwrap();
    let uri = load_photo(&grainy_photo_file(dir.path())).unwrap();
    let stored = DataUri::parse(&uri).unwrap();
    assert_eq!(stored.mime, "image/jpeg");
    assert!(stored.bytes.len() <= MAX_PHOTO_BYTES);

    let record = validate(&draft_with_photo(uri)).unwrap();
    let pipeline = CardExportPipeline::default();
    for template in TemplateId::ALL {
        let surface = pipeline.render(&record, template);
        assert!(!surface.shows_placeholder());
        let png = pipeline.export(surface).await.unwrap();
        assert!(!png.is_empty(), "template {template}");
    }
}

#[tokio::test]
async fn undecodable_photo_is_a_recoverable_export_error() {
    let pipeline = CardExportPipeline::default();
    let mut record = jane();
    record.photo = Some("data:image/png;base64,bm90IGFuIGltYWdl".to_string());
    let surface = pipeline.render(&record, TemplateId::B);
    let err = pipeline.export(surface).await.unwrap_err();
    assert!(matches!(err, ExportError::Photo(_)), "{err}");
}

#[tokio::test]
async fn payload_beyond_symbol_capacity_fails_export() {
    let pipeline = CardExportPipeline::default();
    let mut record = jane();
    record.name = "N".repeat(3000);
    let surface = pipeline.render(&record, TemplateId::A);
    let err = pipeline.export(surface).await.unwrap_err();
    assert!(matches!(err, ExportError::Barcode(_)), "{err}");
}

#[tokio::test]
async fn detached_surface_cannot_be_exported() {
    let pipeline = CardExportPipeline::default();
    let err = pipeline.export(CardSurface::default()).await.unwrap_err();
    assert!(matches!(err, ExportError::Detached { .. }));
}

#[tokio::test]
async fn download_names_and_renders_in_one_step() {
    let pipeline = CardExportPipeline::default();
    let card = pipeline.download(&jane(), TemplateId::B).await.unwrap();
    assert_eq!(card.file_name, "unity-id-jane-doe.png");

    let dir = tempfile::tempdir().unwrap();
    let path = card.save_in(&dir.path().join("cards")).unwrap();
    assert_eq!(std::fs::read(path).unwrap(), card.png);
}

#[test]
fn blocking_export_matches_async_dimensions() {
    let pipeline = CardExportPipeline::default();
    let surface = pipeline.render(&jane(), TemplateId::C);
    let png = pipeline.export_blocking(&surface).unwrap();
    let decoded = image::load_from_memory(&png).unwrap();
    assert_eq!(decoded.width(), surface.size().0 * 2);
}
