pub use diorite_core_server as core_server;
pub use diorite_mc_constants as mc_constants;
pub use diorite_mc_protocol as mc_protocol;
pub use diorite_network as network;
