//! Contract Invariant Tests
//!
//! These tests verify the non-negotiable guarantees.

use chrono::{Local, NaiveDate, NaiveTime, TimeZone};
use image::RgbImage;
use lopdf::{Document, Object};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use labelforge_core::{
    date_code, hu_number, qr_payload, render, ExportError, ExportPipeline, ExportSettings,
    LabelConfig, LabelLayout, LabelRecord, LabelSession, LabelSize, LabelType, RasterError,
    Rasterizer,
};

fn settings(dir: &Path) -> ExportSettings {
    ExportSettings {
        output_dir: dir.to_path_buf(),
        settle_delay: Duration::ZERO,
        ..Default::default()
    }
}

fn files_in(dir: &Path) -> Vec<String> {
    fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect()
}

fn image_count(doc: &Document) -> usize {
    doc.objects
        .values()
        .filter(|obj| match obj {
            Object::Stream(s) => {
                matches!(s.dict.get(b"Subtype"), Ok(Object::Name(n)) if n == b"Image")
            }
            _ => false,
        })
        .count()
}

struct BrokenCapture;

impl Rasterizer for BrokenCapture {
    fn rasterize(&self, _layout: &LabelLayout, _scale: u32) -> Result<RgbImage, RasterError> {
        Err(RasterError::Capture("surface lost".into()))
    }
}

#[derive(Default)]
struct CountingCapture {
    calls: AtomicU32,
}

impl Rasterizer for CountingCapture {
    fn rasterize(&self, layout: &LabelLayout, scale: u32) -> Result<RgbImage, RasterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        labelforge_core::BitmapRasterizer.rasterize(layout, scale)
    }
}

#[test]
fn invariant_date_code_iso_boundaries() {
    let d = |y, m, day| NaiveDate::from_ymd_opt(y, m, day).unwrap();
    assert_eq!(date_code(d(1999, 12, 31)), "9952");
    assert_eq!(date_code(d(2024, 12, 31)), "2501");
    assert_eq!(date_code(d(2027, 1, 1)), "2653");
}

#[test]
fn invariant_identifier_shape() {
    let yyww = date_code(NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
    for (h, m, s) in [(0, 0, 0), (10, 30, 45), (23, 59, 59)] {
        let hu = hu_number(&yyww, NaiveTime::from_hms_opt(h, m, s).unwrap());
        assert_eq!(hu.len(), 19);
        assert!(hu.starts_with('1'));
        assert_eq!(&hu[7..11], yyww);
        assert_eq!(&hu[11..12], "V");
        assert!(hu.ends_with("3000594"));
    }
}

#[test]
fn invariant_payload_end_to_end() {
    let record = LabelRecord {
        sandisk_pn: "SDUC064G".into(),
        hu_number: format!("{}{}{}{}", "1103045", "2518", "V", "3000594"),
        date_code: "2518".into(),
        quantity: "50".into(),
        po_number: "PO123".into(),
        po_line: "10".into(),
        ..Default::default()
    };

    let payload = qr_payload(&record);
    assert_eq!(
        payload,
        "SDUC064G|11030452518V3000594|||2518|||||||||PO123|10|50||||"
    );
    assert_eq!(payload.matches('|').count(), 19);
    assert_eq!(payload.split('|').count(), 20);

    // pure
    assert_eq!(payload, qr_payload(&record.clone()));
}

#[test]
fn invariant_render_is_deterministic_and_carries_payload() {
    let config = LabelConfig::default();
    let now = Local.with_ymd_and_hms(2025, 4, 30, 10, 30, 45).single().unwrap();
    let record = LabelRecord::initial(&config, now);

    for size in [LabelSize::Outer, LabelSize::Inner] {
        let a = render(&record, size, LabelType::Substrate);
        let b = render(&record, size, LabelType::Substrate);
        assert_eq!(a.text_content(), b.text_content());
        assert_eq!(a.payload, qr_payload(&record));
    }
}

#[tokio::test]
async fn invariant_outer_export_is_placed_at_physical_size() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExportPipeline::new(settings(dir.path()));

    let record = LabelRecord {
        hu_number: "abc".into(),
        ..Default::default()
    };
    let layout = render(&record, LabelSize::Outer, LabelType::Substrate);

    let doc = pipeline.export(Some(&layout), &record.hu_number).await.unwrap();
    assert_eq!(doc.filename, "Label_abc.pdf");
    assert_eq!(doc.path, dir.path().join("Label_abc.pdf"));
    assert_eq!((doc.pixel_width, doc.pixel_height), (576 * 4, 310 * 4));
    assert_eq!(doc.placement.x_in, 0.5);
    assert_eq!(doc.placement.y_in, 0.5);
    assert_eq!(doc.placement.width_in, 6.0);
    assert_eq!(doc.placement.height_in, 3.23);
    assert_eq!(files_in(dir.path()), ["Label_abc.pdf"]);

    let bytes = fs::read(&doc.path).unwrap();
    assert_eq!(doc.sha256, labelforge_core::hashing::sha256_hex(&bytes));

    let pdf = Document::load(&doc.path).unwrap();
    let pages = pdf.get_pages();
    assert_eq!(pages.len(), 1);
    assert_eq!(image_count(&pdf), 1);

    let page_id = *pages.values().next().unwrap();
    let content = String::from_utf8(pdf.get_page_content(page_id).unwrap()).unwrap();
    // 6 x 3.23 in, top-left corner 0.5 in from the top-left of A4
    assert!(content.contains("432.00 0 0 232.56 36.00 573.44 cm"), "{content}");
}

#[tokio::test]
async fn invariant_unmounted_export_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExportPipeline::new(settings(dir.path()));

    let err = pipeline.export(None, "abc").await.unwrap_err();
    assert!(matches!(err, ExportError::RenderUnavailable));
    assert!(files_in(dir.path()).is_empty());
    assert!(!pipeline.is_busy());
}

#[tokio::test]
async fn invariant_export_rasterizes_once_and_only_when_mounted() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExportPipeline::with_rasterizer(settings(dir.path()), CountingCapture::default());
    let layout = render(&LabelRecord::default(), LabelSize::Inner, LabelType::NonSubstrate);

    assert!(pipeline.export(None, "").await.is_err());
    assert_eq!(pipeline_calls(&pipeline), 0);

    let doc = pipeline.export(Some(&layout), "").await.unwrap();
    assert_eq!(doc.filename, "Label_Preview.pdf");
    assert_eq!(pipeline_calls(&pipeline), 1);
}

fn pipeline_calls(pipeline: &ExportPipeline<CountingCapture>) -> u32 {
    pipeline.rasterizer().calls.load(Ordering::SeqCst)
}

#[tokio::test]
async fn invariant_capture_failure_writes_nothing_and_stays_reinvokable() {
    let dir = tempfile::tempdir().unwrap();
    let layout = render(&LabelRecord::default(), LabelSize::Inner, LabelType::Substrate);

    let broken = ExportPipeline::with_rasterizer(settings(dir.path()), BrokenCapture);
    let err = broken.export(Some(&layout), "").await.unwrap_err();
    assert!(matches!(err, ExportError::Rasterize(_)));
    assert_eq!(err.user_notice(), "Failed to generate label PDF.");
    assert!(files_in(dir.path()).is_empty());
    assert!(!broken.is_busy());

    let err = broken.export(Some(&layout), "").await.unwrap_err();
    assert!(matches!(err, ExportError::Rasterize(_)));
}

#[tokio::test]
async fn invariant_persist_failure_is_reported() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    fs::write(&blocker, b"").unwrap();

    let pipeline = ExportPipeline::new(settings(&blocker));
    let layout = render(&LabelRecord::default(), LabelSize::Inner, LabelType::Substrate);

    let err = pipeline.export(Some(&layout), "abc").await.unwrap_err();
    assert!(matches!(err, ExportError::Persist(..)));
    assert_eq!(err.user_notice(), "Failed to generate label PDF.");
    assert_eq!(files_in(dir.path()), ["not-a-dir"]);
    assert!(!pipeline.is_busy());
}

#[tokio::test]
async fn invariant_second_export_in_flight_is_refused() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = ExportPipeline::new(ExportSettings {
        settle_delay: Duration::from_millis(50),
        ..settings(dir.path())
    });
    let layout = render(&LabelRecord::default(), LabelSize::Inner, LabelType::Substrate);

    let (first, second) = tokio::join!(
        pipeline.export(Some(&layout), "one"),
        pipeline.export(Some(&layout), "two"),
    );
    assert!(first.is_ok());
    assert!(matches!(second, Err(ExportError::InProgress)));
    assert_eq!(files_in(dir.path()), ["Label_one.pdf"]);
}

#[tokio::test]
async fn invariant_session_export_uses_current_hu() {
    let dir = tempfile::tempdir().unwrap();
    let config = LabelConfig {
        output_dir: dir.path().to_path_buf(),
        settle_delay_ms: 0,
        ..Default::default()
    };
    let pipeline = ExportPipeline::new(ExportSettings::from_config(&config));

    let now = Local.with_ymd_and_hms(2025, 4, 30, 10, 30, 45).single().unwrap();
    let mut session = LabelSession::start(&config, now);
    session.set_field("sandiskPN", "SDUC064G").unwrap();
    session.set_field("quantity", "50").unwrap();

    // nothing mounted yet
    assert!(matches!(
        session.export(&pipeline).await,
        Err(ExportError::RenderUnavailable)
    ));

    session.select_size(LabelSize::Inner);
    session.mount();
    let doc = session.export(&pipeline).await.unwrap();
    assert_eq!(doc.filename, "Label_11030452518V3000594.pdf");
    assert_eq!(doc.size, LabelSize::Inner);
    assert_eq!(doc.placement.width_in, 3.1);
    assert_eq!(doc.placement.height_in, 1.6);
    assert!(doc.path.exists());
}
