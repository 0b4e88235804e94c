//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises a specific subsystem
//! against mock adapters.  All tests run on the host with no broker and
//! no LED hardware required.

mod controller_tests;
mod mock_hw;
mod mqtt_client_tests;
