//! tests/mod.rs
//! Pruebas del despachador, del registro de lotes y de los endpoints HTTP.

mod support;
