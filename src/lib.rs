//! poi-promo: promotional image insertion for points of interest, with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
