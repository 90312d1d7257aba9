//! Sample documents for command tests.

use std::path::Path;

use pdf::testing::pdf_bytes;

const BODY: &str = "Plain body text for the sample document.";

/// Two pages: a bold title, then "1. Introduction" and "1.1 Scope".
pub fn write_sample_pdf(path: &Path) {
    let bytes = pdf_bytes(
        &[
            vec![
                ("F2", 24.0, 72.0, 720.0, "Field Guide"),
                ("F1", 10.0, 72.0, 600.0, BODY),
                ("F1", 10.0, 72.0, 586.0, BODY),
                ("F1", 10.0, 72.0, 572.0, BODY),
            ],
            vec![
                ("F2", 14.0, 72.0, 720.0, "1. Introduction"),
                ("F2", 12.0, 72.0, 690.0, "1.1 Scope"),
                ("F1", 10.0, 72.0, 660.0, BODY),
                ("F1", 10.0, 72.0, 646.0, BODY),
                ("F1", 10.0, 72.0, 632.0, BODY),
            ],
        ],
        None,
    );
    std::fs::write(path, bytes).unwrap();
}
