#![no_main]

use change::{Page, RenderOptions};
use libfuzzer_sys::fuzz_target;

// Input is `<page>\0<response>`; the response replaces `main`.
fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    let (page_html, response) = input.split_once('\0').unwrap_or((input, ""));
    let page = Page::parse(page_html);
    page.boot();
    let _ = page.render(RenderOptions::new("main", response));
    assert!(page.stack().check_invariants().is_ok());
    let _ = page.html();
});
