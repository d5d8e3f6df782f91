use super::test_helpers::*;
use super::*;
use crate::types::Outcome;
use std::time::Duration;
