pub mod test_basic;
pub mod test_control_flow;
pub mod test_errors;
pub mod test_functions;
