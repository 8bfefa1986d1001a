#![no_main]

use dpkg_core::dependency::Dependency;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    let _ = data.parse::<Dependency>();
});
