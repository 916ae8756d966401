pub mod circuits;
pub mod presets;
pub mod read_sim_pars;
pub mod sim_config;
pub mod sim_opts;
