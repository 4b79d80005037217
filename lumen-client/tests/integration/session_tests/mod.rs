mod test_capture_failure;
