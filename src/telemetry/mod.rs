pub mod refresh;
