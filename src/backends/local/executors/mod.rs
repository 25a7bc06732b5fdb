// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod echo;
pub mod merge_upstream;
pub mod static_ir;

pub use echo::EchoExecutor;
pub use merge_upstream::{ConflictResolution, MergeUpstreamExecutor};
pub use static_ir::StaticIrExecutor;
