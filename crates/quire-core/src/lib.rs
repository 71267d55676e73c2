//! Quire Core Types and Definitions
//!
//! This crate provides the document model shared by the Quire parser and
//! its consumers. It includes:
//!
//! - **Attributes**: Typed attribute values and the ordered attribute set ([`attribute`] module)
//! - **Elements**: Block-level nodes of the document tree ([`element`] module)
//! - **Inlines**: Inline nodes such as quoted text, links and footnotes ([`inline`] module)
//! - **Document**: The finalized, read-only document root ([`document`] module)
//! - **Span**: Byte ranges into the source text ([`span::Span`])

pub mod attribute;
pub mod document;
pub mod element;
pub mod inline;
pub mod span;
