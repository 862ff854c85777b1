#![no_main]

use dom::Document;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let mut doc = Document::parse(input);
    let fragment = doc.parse_fragment(input);
    let _ = doc.inner_html(fragment);
    let _ = doc.outer_html(doc.root());
});
