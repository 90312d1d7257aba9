//! Small real PDFs built in memory with lopdf, for tests in this crate and
//! in crates enabling the `testing` feature.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};

/// `(font key, size, x, y, text)`; `F1` is Helvetica, `F2` Helvetica-Bold.
pub type Show<'a> = (&'a str, f32, f32, f32, &'a str);

/// US Letter, origin at 0.
pub const LETTER: [i64; 4] = [0, 0, 612, 792];

/// One page per entry of `pages`, each showing its text with `Tj`.
pub fn pdf_bytes(pages: &[Vec<Show<'_>>], title: Option<&str>) -> Vec<u8> {
    pdf_bytes_with_media_box(pages, title, LETTER)
}

pub fn pdf_bytes_with_media_box(
    pages: &[Vec<Show<'_>>],
    title: Option<&str>,
    media_box: [i64; 4],
) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let regular = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let bold = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let resources = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => regular, "F2" => bold },
    });

    let mut kids: Vec<Object> = Vec::new();
    for shows in pages {
        let mut operations = Vec::new();
        for &(font, size, x, y, text) in shows {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec![font.into(), size.into()]));
            operations.push(Operation::new("Td", vec![x.into(), y.into()]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources,
            "MediaBox" => media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
        });
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => Object::Integer(count),
        }),
    );
    let catalog = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog);
    if let Some(title) = title {
        let info = doc.add_object(dictionary! { "Title" => Object::string_literal(title) });
        doc.trailer.set("Info", info);
    }

    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}
