//! # Slate DQN
//!
//! A slate recommender trained with DQN or Dueling DQN against simulated
//! users, built on the Burn ML framework.
//!
//! ## Modules
//!
//! - [`config`]: YAML experiment configuration, defaults and validation
//! - [`env`]: content catalog, candidate generation, user-state embedding, environment
//! - [`simulation`]: simulated user responses (random and LLM-backed)
//! - [`ai`]: agent trait, DQN agent, Q-networks, random baseline
//! - [`training`]: replay buffer, episode runner, metrics, multi-seed trainer
//! - [`error`]: structured error types

#![recursion_limit = "256"]

pub mod ai;
pub mod config;
pub mod env;
pub mod error;
pub mod simulation;
pub mod training;
