pub mod beacon_state;
pub mod config;
pub mod consts;
pub mod container_impls;
pub mod containers;
pub mod genesis;
pub mod merkle;
pub mod nonstandard;
pub mod primitives;
