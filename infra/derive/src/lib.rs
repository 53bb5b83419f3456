#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the infrastructure.
//! This crate provides the attribute macro every workspace crate uses to declare
//! its error enum, so that errors look and compose the same way everywhere.
//!
//! ## Usage
//! ```toml
//! [dependencies]
//! warren-derive = { path = "../infra/derive" }
//! thiserror = "2"
//! ```
//!
//! The example below is `ignore`d to avoid compiling in this crate; see
//! `tests/ui` for compiled cases.

mod macros;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// A high-level attribute macro for defining domain-specific error enums.
///
/// This macro reduces boilerplate by transforming a standard enum into a fully-featured
/// error type integrated with the workspace infrastructure.
///
/// # Features
///
/// * **Automatic Derives**: Injects `#[derive(Debug, thiserror::Error)]`.
/// * **Context Support**: Generates a companion `...Ext` trait that adds `.context()`
///   to any `Result` that can be converted into this error type.
/// * **Standard Conversions**: Implements `From<T>` for variants containing a `#[source]` field,
///   enabling the use of the `?` operator for upstream errors. When several variants wrap the
///   same source type, no conversion is generated for it and the variant must be built explicitly.
/// * **Internal Fallback**: Provides specialized `From<&str>` and `From<String>` implementations
///   if an `Internal` variant is present.
///
/// # Requirements
///
/// 1. The macro must be applied to an **enum**.
/// 2. Variants that support context must include a `context: Option<Cow<'static, str>>` field.
/// 3. Variants wrapping external errors must include a `source: T` field or a field marked
///    with `#[source]`/`#[from]` (compatible with `thiserror`).
/// 4. Tuple or unit variants are rejected to keep error wiring explicit and reliable.
///
/// # Example
///
/// ```rust,ignore
/// use warren_derive::warren_error;
/// use std::borrow::Cow;
///
/// #[warren_error]
/// pub enum ChannelError {
///     #[error("IO error{}: {source}", format_context(.context))]
///     Io {
///         #[source]
///         source: std::io::Error,
///         context: Option<Cow<'static, str>>,
///     },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read_frame() -> Result<Vec<u8>, ChannelError> {
///     let bytes = std::fs::read("frame.bin").context("Reading frame")?;
///     if bytes.is_empty() {
///         return Err("Empty frame".into());
///     }
///     Ok(bytes)
/// }
/// ```
#[proc_macro_attribute]
pub fn warren_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    macros::error::expand_derive(input).into()
}
