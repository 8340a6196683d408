//! JSON payloads shaped like GitHub's REST responses, shared by unit and integration tests.

pub mod release;
