pub mod cli;
pub mod compare;
pub mod ctx;
pub mod error;
pub mod event;
pub mod fit;
pub mod io;
pub mod materials;
pub mod pipeline;
pub mod reference;
pub mod run;
pub mod schema;
