mod event_filtering;
