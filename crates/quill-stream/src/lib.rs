//! Quill Streaming
//!
//! Decodes the namespaced streaming key protocol and assembles the section
//! the remote agent is currently writing.
//!
//! # Core Concepts
//!
//! - [`StreamKey`]: Typed form of `section_stream.<field>.<idx>.<id>.<title>`
//! - [`decode_bag`]: Flat remote bag → ordered [`SectionDelta`]s
//! - [`SectionAssembler`]: Reducer holding the single in-flight [`PartialSection`]
//!
//! # Example
//!
//! ```rust,ignore
//! use quill_stream::SectionAssembler;
//!
//! let mut assembler = SectionAssembler::new();
//! assembler.ingest(&remote_bag);
//!
//! if let Some(section) = assembler.current() {
//!     println!("writing {}: {:?}", section.title, section.content);
//! }
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

// Core modules
mod assembler;
mod decode;
mod key;

// Re-exports
pub use assembler::{AssemblyStep, PartialSection, SectionAssembler};
pub use decode::{decode_bag, decode_entry, DecodeError, Decoded, SectionDelta};
pub use key::{
    KeyError, StreamField, StreamKey, KEY_DELIMITER, MIN_SEGMENTS, STREAM_NAMESPACE,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn push(assembler: &mut SectionAssembler, bag: Value) {
        let bag: Map<String, Value> = bag.as_object().cloned().unwrap();
        assembler.ingest(&bag);
    }

    #[test]
    fn section_lifecycle_across_pushes() {
        let mut assembler = SectionAssembler::new();

        push(&mut assembler, json!({"section_stream.content.0.s1.Intro": "Hel"}));
        push(&mut assembler, json!({"section_stream.content.0.s1.Intro": "Hello"}));
        push(
            &mut assembler,
            json!({
                "section_stream.content.0.s1.Intro": "Hello",
                "section_stream.footer.0.s1.Intro": "[1] src"
            }),
        );

        let current = assembler.current().cloned().unwrap();
        assert_eq!(current.content.as_deref(), Some("Hello"));
        assert_eq!(current.footer.as_deref(), Some("[1] src"));

        // Agent settles the section and nulls its stream keys
        push(
            &mut assembler,
            json!({
                "sections": [{"id": "s1", "idx": 0, "title": "Intro", "content": "Hello"}],
                "section_stream.content.0.s1.Intro": null,
                "section_stream.footer.0.s1.Intro": null
            }),
        );
        assert!(assembler.current().is_none());
    }

    #[test]
    fn key_display_feeds_decoder() {
        let key = StreamKey::new(StreamField::Footer, 7, "q1", "Method");
        let mut bag = Map::new();
        bag.insert(key.to_string(), json!("[1] paper"));

        let deltas = decode_bag(&bag);
        assert_eq!(deltas, vec![SectionDelta::new(key, "[1] paper")]);
    }
}
