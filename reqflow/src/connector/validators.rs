//! Response validators.
//!
//! A [`Validator`] decides whether a response settles through `Ok` or
//! `Fail`. Connectors have none by default, which treats every response as
//! valid.

use std::sync::Arc;

use crate::transport::Response;

/// Decides whether a response is valid.
pub type Validator = Arc<dyn Fn(&Response) -> bool + Send + Sync>;

/// Accepts 2xx responses.
#[must_use]
pub fn success_status() -> Validator {
    Arc::new(Response::is_success)
}

/// Accepts responses whose status is one of `codes`.
#[must_use]
pub fn status_in(codes: &[u16]) -> Validator {
    let codes = codes.to_vec();
    Arc::new(move |response| codes.contains(&response.status))
}

/// Accepts responses with exactly this status.
#[must_use]
pub fn status_equals(code: u16) -> Validator {
    Arc::new(move |response| response.status == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_status() {
        let validate = success_status();
        assert!(validate(&Response::new(200)));
        assert!(validate(&Response::new(299)));
        assert!(!validate(&Response::new(302)));
        assert!(!validate(&Response::new(500)));
    }

    #[test]
    fn test_status_in_and_equals() {
        let validate = status_in(&[200, 304]);
        assert!(validate(&Response::new(304)));
        assert!(!validate(&Response::new(201)));

        let validate = status_equals(201);
        assert!(validate(&Response::new(201)));
        assert!(!validate(&Response::new(200)));
    }
}
