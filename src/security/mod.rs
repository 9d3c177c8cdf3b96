pub mod bearer_gate;
