mod test_gain_feedback;
