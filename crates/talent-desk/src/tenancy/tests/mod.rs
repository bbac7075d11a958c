mod applications;
mod common;
mod plans;
mod quota;
