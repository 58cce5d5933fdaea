//! services/template_service.rs
//! Sustitución de placeholders `{{ columna }}` con los valores de una fila.
//!
//! El nombre del placeholder se extrae completo y se busca de forma exacta en la
//! fila, nunca se interpola en un patrón. Así una columna "Name" no toca
//! `{{FullName}}` y columnas con caracteres especiales (`.`, `$`, `(`...) no
//! alteran el match.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::models::campaign_model::Row;

fn placeholder_regex() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        // `{{`, espacios opcionales, nombre sin llaves, espacios opcionales, `}}`
        Regex::new(r"\{\{\s*([^{}]*?)\s*\}\}").expect("placeholder regex is valid")
    })
}

/// Valor de la columna `name`. Si no hay coincidencia exacta se acepta una clave con
/// espacios alrededor (cabeceras CSV tipo `name, email`).
pub fn column<'r>(row: &'r Row, name: &str) -> Option<&'r String> {
    row.get(name).or_else(|| {
        row.iter()
            .filter(|(key, _)| key.trim() == name)
            .min_by(|(a, _), (b, _)| a.cmp(b))
            .map(|(_, value)| value)
    })
}

/// Reemplaza cada placeholder cuyo nombre exista en `row`.
/// Los placeholders sin columna se dejan tal cual, para que el error de datos sea visible.
pub fn personalize(template: &str, row: &Row) -> String {
    placeholder_regex()
        .replace_all(template, |caps: &Captures| match column(row, &caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Nombres de placeholder en orden de primera aparición, sin repetir.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    placeholder_regex()
        .captures_iter(template)
        .map(|caps| caps[1].to_string())
        .filter(|name| seen.insert(name.clone()))
        .collect()
}

/// Placeholders del template que ninguna de las columnas conocidas resuelve.
pub fn missing_placeholders<'a, I>(template: &str, columns: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let columns: HashSet<&str> = columns.into_iter().map(|c| c.trim()).collect();
    placeholders(template)
        .into_iter()
        .filter(|name| !columns.contains(name.as_str()))
        .collect()
}
