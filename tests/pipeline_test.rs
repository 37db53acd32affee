//! Integration tests for page transcoding and trials.

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{build_pdf, page_widths, pixels, AreaCodec, PageKind, StubRasterizer};
use pdfsqueeze::document::classify_all;
use pdfsqueeze::pipeline::{PageTranscoder, TrialExecutor, TrialRunner};
use pdfsqueeze::{LopdfAssembler, PageClassification, PdfSource, SEARCH_TIERS};

fn pool(threads: usize) -> rayon::ThreadPool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .unwrap()
}

#[test]
fn test_page_order_survives_out_of_order_workers() {
    let widths = [72, 80, 88, 96, 104, 112];
    let pages: Vec<_> = widths.iter().map(|&w| (PageKind::Text, w, 72)).collect();
    let pdf = build_pdf(&pages);
    let source = PdfSource::from_bytes(&pdf).unwrap();
    let classes = classify_all(&source);

    let rasterizer = Arc::new(StubRasterizer {
        reverse_delay: Some(Duration::from_millis(5)),
        ..StubRasterizer::new()
    });
    let codec = Arc::new(AreaCodec::new());
    let transcoder = PageTranscoder::new(rasterizer, codec.clone());
    let assembler = LopdfAssembler::new();
    let pool = pool(4);

    let executor =
        TrialExecutor::new(&source, &classes, &transcoder, &assembler).with_pool(Some(&pool));
    let candidate = executor.run_trial(&SEARCH_TIERS[0]).unwrap();

    let expected: Vec<f32> = widths.iter().map(|&w| pixels(w as f32, 120) as f32).collect();
    assert_eq!(page_widths(&candidate.bytes), expected);

    // The delays make the last page finish first.
    let encoded: Vec<u32> = codec.calls().iter().map(|c| c.width).collect();
    assert_ne!(encoded, expected.iter().map(|&w| w as u32).collect::<Vec<_>>());
}

#[test]
fn test_parallel_matches_sequential_bytes() {
    let pdf = build_pdf(&[
        (PageKind::Text, 72, 72),
        (PageKind::Scanned, 90, 60),
        (PageKind::Broken, 72, 100),
    ]);
    let source = PdfSource::from_bytes(&pdf).unwrap();
    let classes = classify_all(&source);
    let transcoder = PageTranscoder::new(
        Arc::new(StubRasterizer::new()),
        Arc::new(AreaCodec::new()),
    );
    let assembler = LopdfAssembler::new();
    let pool = pool(3);

    let sequential = TrialExecutor::new(&source, &classes, &transcoder, &assembler);
    let parallel =
        TrialExecutor::new(&source, &classes, &transcoder, &assembler).with_pool(Some(&pool));

    for tier in &SEARCH_TIERS {
        assert_eq!(
            sequential.run_trial(tier).unwrap().bytes,
            parallel.run_trial(tier).unwrap().bytes
        );
    }
}

#[test]
fn test_search_tiers_shrink_monotonically() {
    let pdf = build_pdf(&[
        (PageKind::Text, 72, 72),
        (PageKind::Scanned, 72, 72),
        (PageKind::Text, 144, 72),
        (PageKind::Broken, 72, 72),
    ]);
    let source = PdfSource::from_bytes(&pdf).unwrap();
    let classes = classify_all(&source);
    let transcoder = PageTranscoder::new(
        Arc::new(StubRasterizer::new()),
        Arc::new(AreaCodec::new()),
    );
    let assembler = LopdfAssembler::new();
    let executor = TrialExecutor::new(&source, &classes, &transcoder, &assembler);

    let sizes: Vec<u64> = SEARCH_TIERS
        .iter()
        .map(|tier| executor.run_trial(tier).unwrap().size())
        .collect();
    assert!(
        sizes.windows(2).all(|pair| pair[0] >= pair[1]),
        "sizes not monotonic: {:?}",
        sizes
    );
}

#[test]
fn test_failed_inspection_transcodes_like_image_heavy() {
    let broken = build_pdf(&[(PageKind::Broken, 72, 72)]);
    let scanned = build_pdf(&[(PageKind::Scanned, 72, 72)]);

    let run = |pdf: &[u8]| {
        let source = PdfSource::from_bytes(pdf).unwrap();
        let classes = classify_all(&source);
        let codec = Arc::new(AreaCodec::new());
        let transcoder = PageTranscoder::new(Arc::new(StubRasterizer::new()), codec.clone());
        let assembler = LopdfAssembler::new();
        let candidate = TrialExecutor::new(&source, &classes, &transcoder, &assembler)
            .run_trial(&SEARCH_TIERS[3])
            .unwrap();
        (classes, codec.calls(), candidate.size())
    };

    let (broken_classes, broken_calls, broken_size) = run(&broken);
    let (scanned_classes, scanned_calls, scanned_size) = run(&scanned);

    assert_eq!(broken_classes, vec![PageClassification::ImageHeavy]);
    assert_eq!(broken_classes, scanned_classes);
    assert_eq!(broken_calls, scanned_calls);
    assert_eq!(broken_size, scanned_size);
}

#[test]
fn test_tier_adjustments_by_classification() {
    let pdf = build_pdf(&[(PageKind::Text, 72, 72), (PageKind::Scanned, 72, 72)]);
    let source = PdfSource::from_bytes(&pdf).unwrap();
    let classes = classify_all(&source);
    let codec = Arc::new(AreaCodec::new());
    let transcoder = PageTranscoder::new(Arc::new(StubRasterizer::new()), codec.clone());
    let assembler = LopdfAssembler::new();

    // 50 dpi, q0.25, x0.85, gray
    let candidate = TrialExecutor::new(&source, &classes, &transcoder, &assembler)
        .run_trial(&SEARCH_TIERS[3])
        .unwrap();
    let calls = codec.calls();

    // Text page: grayscale and downscaled, tier quality.
    assert_eq!((calls[0].width, calls[0].height), (42, 42));
    assert_eq!(calls[0].channels, 1);
    assert!((calls[0].quality - 0.25).abs() < 1e-6);

    // Scanned page: full size, color, quality bumped by 0.10.
    assert_eq!((calls[1].width, calls[1].height), (50, 50));
    assert_eq!(calls[1].channels, 3);
    assert!((calls[1].quality - 0.35).abs() < 1e-6);

    assert_eq!(page_widths(&candidate.bytes), vec![42.0, 50.0]);
}

#[test]
fn test_failing_page_aborts_trial() {
    let pdf = build_pdf(&vec![(PageKind::Text, 72, 72); 8]);
    let source = PdfSource::from_bytes(&pdf).unwrap();
    let classes = classify_all(&source);
    let rasterizer = Arc::new(StubRasterizer {
        failing_pages: vec![2, 5],
        ..StubRasterizer::new()
    });
    let transcoder = PageTranscoder::new(rasterizer, Arc::new(AreaCodec::new()));
    let assembler = LopdfAssembler::new();
    let pool = pool(2);

    let err = TrialExecutor::new(&source, &classes, &transcoder, &assembler)
        .with_pool(Some(&pool))
        .run_trial(&SEARCH_TIERS[0])
        .unwrap_err();
    assert!(matches!(err, pdfsqueeze::Error::Render { .. }));
}
