// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

// Common parsing utilities for number extraction from vendor tool output.

use std::str::FromStr;

use regex::Regex;

/// Parse a number from a string after sanitizing by removing commas, underscores, and trimming.
/// Returns None if parsing fails.
pub fn parse_number<T: FromStr>(s: &str) -> Option<T> {
    let cleaned = s.trim().replace([',', '_'], "");
    cleaned.parse::<T>().ok()
}

/// Scan `output` line by line and parse the first capture group of the first
/// matching line.
pub fn first_captured_number(re: &Regex, output: &str) -> Option<f64> {
    output.lines().find_map(|line| {
        re.captures(line)
            .and_then(|cap| cap.get(1))
            .and_then(|m| parse_number::<f64>(m.as_str()))
    })
}
