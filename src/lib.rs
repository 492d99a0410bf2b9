mod kex;
pub use kex::*;
mod ntt;
mod pack;
mod params;
mod poly;
mod rec;
mod reduce;
mod symmetric;
pub use params::{MSG_A_BYTES, MSG_B_BYTES, SEED_BYTES, SHARED_BYTES};
pub use symmetric::DefaultProvider;
