// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default number of nodes of one level that may run at the same time
pub const DEFAULT_MAX_CONCURRENCY: usize = 4;
/// Upper bound for `max_concurrency`
pub const MAX_CONCURRENCY_LIMIT: usize = 256;
/// Upper bound for `timeout_seconds` (one day)
pub const MAX_TIMEOUT_SECONDS: u64 = 86_400;
