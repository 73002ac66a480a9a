//! # gait-rag
//!
//! A minimal retrieval-augmented-generation workshop over a small dataset of
//! runner and animal gait metrics.
//!
//! A question is matched against the dataset with plain keyword rules, the
//! matching rows and metric definitions are assembled into a text context,
//! and a chat-completion model is asked to answer using only that context.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌────────────┐   ┌────────────┐
//! │ EntityStore  │──▶│  retrieve() │──▶│ Enrichers  │──▶│  answer()  │──▶ LLM
//! │ Definitions  │   │  keywords   │   │ stride/eff │   │  prompt    │
//! └──────────────┘   └─────────────┘   └────────────┘   └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gait                                   # interactive loop
//! gait ask "Which animal runs most like Usain Bolt?"
//! gait context "Tell me about Bolt"      # retrieval only, no LLM call
//! gait --efficiency context "best form"
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Entities, enums, and metric descriptors |
//! | [`seed`] | Built-in dataset |
//! | [`store`] | Ordered stores and JSON persistence |
//! | [`retrieve`] | Keyword context retrieval |
//! | [`enrich`] | Stride length and efficiency score extensions |
//! | [`completion`] | Completion provider abstraction |
//! | [`answer`] | Prompt template and answering facade |
//! | [`pipeline`] | Stores + enrichers + provider in one value |
//! | [`stats`] | Human vs animal averages |
//! | [`repl`] | Interactive loop |

pub mod answer;
pub mod completion;
pub mod config;
pub mod enrich;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod repl;
pub mod retrieve;
pub mod seed;
pub mod stats;
pub mod store;
