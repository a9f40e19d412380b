// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Startup diagnostics for configuration mistakes.
//!
//! `balcao.toml` is hand-edited by shop operators, so extraction failures
//! become miette reports that point at the offending line and suggest the
//! key the operator probably meant. The config nests exactly one level
//! deep (a handful of `[section]` tables); both the span search and the
//! suggestion flow lean on that shape.

#![allow(unused_assignments)] // the Diagnostic derive trips this lint

use std::fmt::Write as _;

use miette::{Diagnostic, GraphicalReportHandler, NamedSource, SourceSpan};
use thiserror::Error;

/// Jaro-Winkler floor below which no suggestion is offered. `prot`
/// scores ~0.93 against `port`; unrelated words land well under 0.75.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// One reportable configuration problem.
///
/// `UnknownKey` and `InvalidType` carry an optional span into the TOML
/// file the bad value came from; the span is absent when the value
/// arrived through an environment variable or an inline document.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    #[error("unknown configuration key `{key}`")]
    #[diagnostic(
        code(balcao::config::unknown_key),
        help("{}", unknown_key_help(suggestion.as_deref(), valid_keys))
    )]
    UnknownKey {
        key: String,
        /// Closest accepted key in the same section, if any is close.
        suggestion: Option<String>,
        /// Comma-joined keys the section accepts.
        valid_keys: String,
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("invalid type for key `{key}`: {detail}")]
    #[diagnostic(code(balcao::config::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// Dotted path of the value, e.g. `server.port`.
        key: String,
        detail: String,
        expected: String,
        #[label("wrong type here")]
        span: Option<SourceSpan>,
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    #[error("missing required key `{key}`")]
    #[diagnostic(
        code(balcao::config::missing_key),
        help("add `{key} = <value>` to your balcao.toml")
    )]
    MissingKey { key: String },

    /// Cross-field rule violation found after extraction succeeded.
    #[error("validation error: {message}")]
    #[diagnostic(code(balcao::config::validation))]
    Validation { message: String },

    #[error("configuration error: {0}")]
    #[diagnostic(code(balcao::config::other))]
    Other(String),
}

impl ConfigError {
    /// Build an unknown-key error for a section, suggestion included.
    fn unknown_key(field: &str, accepted: &[&str]) -> Self {
        ConfigError::UnknownKey {
            key: field.to_owned(),
            suggestion: suggest_key(field, accepted),
            valid_keys: accepted.join(", "),
            span: None,
            src: None,
        }
    }

    /// Attach the file location of `needle`, when the error came out of a
    /// TOML file whose content is on hand. Variants without a span slot
    /// pass through unchanged.
    fn pinned(
        mut self,
        needle: &str,
        section: Option<&str>,
        origin: Option<&str>,
        sources: &[(String, String)],
    ) -> Self {
        let Some((path, content)) =
            origin.and_then(|o| sources.iter().find(|(p, _)| p.as_str() == o))
        else {
            return self;
        };
        let Some(offset) = key_offset(content, section, needle) else {
            return self;
        };
        if let ConfigError::UnknownKey { span, src, .. }
        | ConfigError::InvalidType { span, src, .. } = &mut self
        {
            *span = Some(SourceSpan::new(offset.into(), needle.len()));
            *src = Some(NamedSource::new(path, content.clone()));
        }
        self
    }
}

fn unknown_key_help(suggestion: Option<&str>, valid_keys: &str) -> String {
    suggestion
        .map(|s| format!("did you mean `{s}`? Valid keys: {valid_keys}"))
        .unwrap_or_else(|| format!("valid keys: {valid_keys}"))
}

/// Fan a `figment::Error` out into per-key diagnostics.
///
/// Figment accumulates every extraction failure into one error value;
/// each becomes its own report so the operator can fix the whole file in
/// one pass instead of replaying the boot per mistake.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    err.into_iter().map(|e| classify(e, toml_sources)).collect()
}

/// Turn one figment error into the matching diagnostic.
///
/// `error.path` locates the value inside the merged config. The model is
/// one level deep, so a two-element path is `[section]` plus key and a
/// one-element path is a top-level name.
fn classify(error: figment::error::Error, sources: &[(String, String)]) -> ConfigError {
    use figment::error::Kind;

    let origin = file_origin(&error);

    match &error.kind {
        Kind::UnknownField(field, accepted) => {
            let accepted: Vec<&str> = accepted.to_vec();
            let section = error.path.first().map(String::as_str);
            ConfigError::unknown_key(field, &accepted).pinned(
                field,
                section,
                origin.as_deref(),
                sources,
            )
        }
        Kind::InvalidType(found, wanted) => {
            let invalid = ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {found}, expected {wanted}"),
                expected: wanted.to_string(),
                span: None,
                src: None,
            };
            match error.path.as_slice() {
                [section, key] => {
                    invalid.pinned(key, Some(section.as_str()), origin.as_deref(), sources)
                }
                [key] => invalid.pinned(key, None, origin.as_deref(), sources),
                _ => invalid,
            }
        }
        Kind::MissingField(field) => ConfigError::MissingKey {
            key: field.to_string(),
        },
        _ => ConfigError::Other(error.to_string()),
    }
}

/// Path of the TOML file a figment error originated from, if any.
fn file_origin(error: &figment::error::Error) -> Option<String> {
    match error.metadata.as_ref()?.source.as_ref()? {
        figment::Source::File(path) => Some(path.display().to_string()),
        _ => None,
    }
}

/// Byte offset of `key` within its section of a TOML document.
///
/// Scans only the lines between the `[section]` header and the next
/// header, so a key that also exists in a later section is never
/// mis-attributed.
fn key_offset(content: &str, section: Option<&str>, key: &str) -> Option<usize> {
    let body = match section {
        None => 0,
        Some(name) => {
            let header = format!("[{name}]");
            content.find(&header)? + header.len()
        }
    };

    let mut at = body;
    for line in content[body..].lines() {
        let stripped = line.trim_start();
        if stripped.starts_with('[') && at > body {
            break;
        }
        if let Some(rest) = stripped.strip_prefix(key)
            && rest.trim_start().starts_with('=')
        {
            return Some(at + (line.len() - stripped.len()));
        }
        at += line.len() + 1;
    }
    None
}

/// The accepted key most similar to `unknown`, if any clears the floor.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    valid_keys
        .iter()
        .map(|k| (strsim::jaro_winkler(unknown, k), *k))
        .filter(|(score, _)| *score > SUGGESTION_THRESHOLD)
        .max_by(|(a, _), (b, _)| a.total_cmp(b))
        .map(|(_, k)| k.to_owned())
}

/// Print every error as a graphical report on stderr, with a closing
/// count line for operators scanning the service log.
pub fn render_errors(errors: &[ConfigError]) {
    let handler = GraphicalReportHandler::new();
    let mut out = String::new();
    for error in errors {
        if handler
            .render_report(&mut out, error as &dyn Diagnostic)
            .is_err()
        {
            let _ = writeln!(out, "erro de configuração: {error}");
        }
    }
    let _ = writeln!(out, "balcao: {} erro(s) de configuração", errors.len());
    eprint!("{out}");
}
