pub mod patent_route;
