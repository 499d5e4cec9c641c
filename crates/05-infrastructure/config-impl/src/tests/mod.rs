mod property_source_tests;
