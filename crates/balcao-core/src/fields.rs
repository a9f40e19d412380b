// SPDX-FileCopyrightText: 2026 Balcao Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Ordered field-resolution tables for loosely-typed external rows.
//!
//! The external stores expose rows whose column names drift across table
//! revisions (`nome` vs `Nome` vs `Pushname`). Instead of inline chained
//! fallbacks, each dashboard field declares its candidate keys in priority
//! order plus a default, so the precedence is data and independently
//! testable.

use serde_json::{Map, Value};

/// Candidate external column names for one dashboard field, highest
/// priority first, with the default used when none resolve.
#[derive(Debug, Clone, Copy)]
pub struct FieldLookup {
    pub candidates: &'static [&'static str],
    pub default: &'static str,
}

impl FieldLookup {
    /// Resolve this field against a raw row.
    ///
    /// The first candidate key with a non-null, non-empty value wins.
    /// Non-string scalars are stringified (the store returns numeric ids
    /// for phone columns in some revisions).
    pub fn resolve(&self, row: &Map<String, Value>) -> String {
        for key in self.candidates {
            match row.get(*key) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Number(n)) => return n.to_string(),
                Some(Value::Bool(b)) => return b.to_string(),
                _ => continue,
            }
        }
        self.default.to_string()
    }

    /// Resolve as f64, tolerating numeric strings; malformed values fall
    /// back to 0.0 rather than erroring.
    pub fn resolve_f64(&self, row: &Map<String, Value>) -> f64 {
        for key in self.candidates {
            match row.get(*key) {
                Some(Value::Number(n)) => return n.as_f64().unwrap_or(0.0),
                Some(Value::String(s)) if !s.is_empty() => {
                    return s.trim().replace(',', ".").parse().unwrap_or(0.0);
                }
                _ => continue,
            }
        }
        self.default.parse().unwrap_or(0.0)
    }

    /// Resolve as bool; accepts booleans and "true"/"false" strings.
    pub fn resolve_bool(&self, row: &Map<String, Value>) -> bool {
        for key in self.candidates {
            match row.get(*key) {
                Some(Value::Bool(b)) => return *b,
                Some(Value::String(s)) if !s.is_empty() => {
                    return s.eq_ignore_ascii_case("true");
                }
                _ => continue,
            }
        }
        self.default == "true"
    }
}

/// Lead columns as found across revisions of the CRM table.
pub mod lead {
    use super::FieldLookup;

    pub const NOME: FieldLookup = FieldLookup {
        candidates: &["nome", "Nome", "Pushname"],
        default: "Lead s/ Nome",
    };
    pub const TELEFONE: FieldLookup = FieldLookup {
        candidates: &["telefone", "Telefone", "ID"],
        default: "",
    };
    pub const EMAIL: FieldLookup = FieldLookup {
        candidates: &["email", "Email"],
        default: "",
    };
    pub const STATUS: FieldLookup = FieldLookup {
        candidates: &["status", "Status"],
        default: "novo",
    };
    pub const ORIGEM: FieldLookup = FieldLookup {
        candidates: &["origem", "Origem"],
        default: "WhatsApp",
    };
    pub const NOTAS: FieldLookup = FieldLookup {
        candidates: &["notas", "Notas", "nova info para guardar"],
        default: "",
    };
    pub const DATA: FieldLookup = FieldLookup {
        candidates: &["data_cadastrado", "Created on"],
        default: "",
    };
}

/// Order columns.
pub mod pedido {
    use super::FieldLookup;

    pub const CLIENTE: FieldLookup = FieldLookup {
        candidates: &["cliente", "Cliente"],
        default: "Cliente não informado",
    };
    pub const ITENS: FieldLookup = FieldLookup {
        candidates: &["itens", "Itens"],
        default: "",
    };
    pub const TOTAL: FieldLookup = FieldLookup {
        candidates: &["total", "Total"],
        default: "0",
    };
    pub const ENDERECO: FieldLookup = FieldLookup {
        candidates: &["endereco", "Endereco", "Endereço"],
        default: "Não informado",
    };
    pub const WHATSAPP: FieldLookup = FieldLookup {
        candidates: &["whatsapp", "Whatsapp", "WhatsApp"],
        default: "Não informado",
    };
    pub const DATA_HORA: FieldLookup = FieldLookup {
        candidates: &["data_hora", "Data"],
        default: "",
    };
    pub const STATUS: FieldLookup = FieldLookup {
        candidates: &["status", "Status"],
        default: "pendente",
    };
    pub const ORIGEM: FieldLookup = FieldLookup {
        candidates: &["origem", "Origem"],
        default: "whatsapp",
    };
}

/// Campaign columns.
pub mod campanha {
    use super::FieldLookup;

    pub const NOME: FieldLookup = FieldLookup {
        candidates: &["nome", "Nome"],
        default: "",
    };
    pub const DESCRICAO: FieldLookup = FieldLookup {
        candidates: &["descricao", "Descricao", "Descrição"],
        default: "",
    };
    pub const LINK: FieldLookup = FieldLookup {
        candidates: &["link", "Link"],
        default: "",
    };
    pub const ATIVA: FieldLookup = FieldLookup {
        candidates: &["ativa", "Ativa"],
        default: "false",
    };
    pub const DATA_CRIACAO: FieldLookup = FieldLookup {
        candidates: &["data_criacao", "Created on"],
        default: "",
    };
}
