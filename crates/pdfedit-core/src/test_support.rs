//! Shared test fixtures: minimal but structurally valid PDFs built with
//! lopdf, one content stream per page carrying identifiable text.

use lopdf::{
    content::{Content, Operation},
    Dictionary, Document, Object, Stream,
};

pub fn build_test_pdf(num_pages: u32) -> Vec<u8> {
    build_test_pdf_sized(num_pages, 612, 792)
}

pub fn build_test_pdf_sized(num_pages: u32, width: i64, height: i64) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();

    let mut page_ids = Vec::new();
    for i in 0..num_pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec![Object::Name(b"F1".to_vec()), Object::Integer(12)]),
                Operation::new("Td", vec![Object::Integer(100), Object::Integer(700)]),
                Operation::new(
                    "Tj",
                    vec![Object::String(
                        format!("Page {}", i + 1).into_bytes(),
                        lopdf::StringFormat::Literal,
                    )],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));

        let page = Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(width),
                    Object::Integer(height),
                ]),
            ),
            ("Contents", Object::Reference(content_id)),
        ]);
        page_ids.push(doc.add_object(page));
    }

    let pages = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Pages".to_vec())),
        ("Count", Object::Integer(num_pages as i64)),
        (
            "Kids",
            Object::Array(page_ids.iter().map(|id| Object::Reference(*id)).collect()),
        ),
    ]);
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog = Dictionary::from_iter(vec![
        ("Type", Object::Name(b"Catalog".to_vec())),
        ("Pages", Object::Reference(pages_id)),
    ]);
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", Object::Reference(catalog_id));

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// A tiny valid 1x1 red RGB PNG, base64-encoded as a data URL.
pub fn red_pixel_data_url() -> String {
    let png = encode_png(1, 1, &[255, 0, 0], png::ColorType::Rgb);
    format!("data:image/png;base64,{}", base64_encode(&png))
}

/// A 2x2 RGBA PNG with one transparent corner, as a data URL.
pub fn transparent_corner_data_url() -> String {
    let pixels = [
        0u8, 0, 0, 255, /**/ 255, 255, 255, 255, //
        128, 128, 128, 255, /**/ 0, 0, 0, 0,
    ];
    let png = encode_png(2, 2, &pixels, png::ColorType::Rgba);
    format!("data:image/png;base64,{}", base64_encode(&png))
}

fn encode_png(width: u32, height: u32, data: &[u8], color: png::ColorType) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }
    out
}

fn base64_encode(bytes: &[u8]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    STANDARD.encode(bytes)
}
