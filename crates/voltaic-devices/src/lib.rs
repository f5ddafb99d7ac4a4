pub mod capacitor;
pub mod component;
pub mod controlled_sources;
pub mod coupled_inductor;
pub mod current_source;
pub mod diode;
pub mod error;
pub mod index_map;
pub mod inductor;
pub mod mosfet;
pub mod prelude;
pub mod resistor;
pub mod stamp;
pub mod switch;
pub mod voltage_source;
pub mod waveform;
