#![no_main]

use change::parse_target;
use core_types::Placement;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(input) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(plans) = parse_target(input, Placement::Replace) {
        for (selector, _) in plans {
            assert!(!selector.trim().is_empty());
        }
    }
});
