mod harness;
mod test_refresh;
