//! Hand-off files written for downstream pipeline stages.
//!
//! # Submodules
//!
//! - [`json`]: Writes the claimed topic for the article stage
//!
//! # Output Structure
//!
//! ```text
//! 01_temas/
//! ├── temas_pendientes.json   # pending queue (see crate::store)
//! └── tema_actual.json        # last claimed topic
//! ```

pub mod json;
