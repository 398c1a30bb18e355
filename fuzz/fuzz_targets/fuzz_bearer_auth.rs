//! Fuzz target: `BearerAuth::check`
//!
//! Splits the input into a configured token and an `Authorization`
//! header value and verifies:
//! - No panics under any byte sequence
//! - A header is accepted ONLY when it carries exactly the configured token
//! - A disabled gate accepts everything
//!
//! cargo fuzz run fuzz_bearer_auth

#![no_main]

use libfuzzer_sys::fuzz_target;
use sprinkler::adapters::auth::BearerAuth;

fuzz_target!(|data: &[u8]| {
    let Some((&split, rest)) = data.split_first() else {
        return;
    };
    let split = usize::from(split).min(rest.len());
    let (token, header) = rest.split_at(split);
    let (Ok(token), Ok(header)) = (std::str::from_utf8(token), std::str::from_utf8(header)) else {
        return;
    };

    assert!(BearerAuth::disabled().check(Some(header)).is_ok());

    let token = token.trim();
    if token.is_empty() {
        return;
    }
    let auth = BearerAuth::new(Some(token));
    let accepted = auth.check(Some(header)).is_ok();
    let presented = header
        .trim()
        .split_once(' ')
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, t)| t.trim());
    if accepted {
        assert_eq!(presented, Some(token));
    }
    assert!(auth.check(None).is_err());
});
