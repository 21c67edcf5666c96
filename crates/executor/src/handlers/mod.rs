//! Command handlers organized by engine component.
//!
//! | Module | Commands | Component |
//! |--------|----------|-----------|
//! | `index` | 10 | Index Manager |
//! | `vector` | 7 | Vector store and batch pipeline |
//! | `search` | 5 | Search engine |
//! | `collection` | 6 | Collection Manager |
//! | `backup` | 5 | Backup/Restore Manager |
//! | `monitor` | 5 | Liveness and statistics |

pub mod backup;
pub mod collection;
pub mod index;
pub mod monitor;
pub mod search;
pub mod vector;
