mod property_ring;
