use std::{env, fs, path::PathBuf};

use metricplan::{
    DataSet,
    join_builder::{AnnotatedDataSet, JoinRequest, SqlJoinBuilder},
    logging, DunderColumnAssociationResolver, MetricplanConfig, SemanticModelToDataSetConverter,
    SqlRenderer,
};

fn usage() {
    eprintln!("Usage: print_join <models_dir> <left_model> <right_model> <request_json>");
    eprintln!(
        "Example: cargo run --example print_join -- examples/models bookings listings_scd examples/requests/bookings_listings.json"
    );
}

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 4 {
        usage();
        std::process::exit(1);
    }

    let models_dir = PathBuf::from(args.remove(0));
    let left_model = args.remove(0);
    let right_model = args.remove(0);
    let request_path = PathBuf::from(args.remove(0));

    let config = MetricplanConfig::load_default();
    logging::init_tracing(&config.logging);

    let lookup = metricplan::load_semantic_models(models_dir)?;
    let resolver = DunderColumnAssociationResolver::with_naming(&lookup, config.naming_scheme());
    let converter = SemanticModelToDataSetConverter::new(resolver);
    let left = converter.create_sql_data_set(&left_model)?;
    let right = converter.create_sql_data_set(&right_model)?;

    let request_str = fs::read_to_string(request_path)?;
    let mut request: JoinRequest = serde_json::from_str(&request_str)?;
    if request.validity_window.is_none() {
        request.validity_window = lookup.validity_window(&right_model)?;
    }

    let join = SqlJoinBuilder::new().build_identifier_join(
        &AnnotatedDataSet::new(&left, &left_model),
        &AnnotatedDataSet::new(&right, &right_model),
        &request,
    )?;

    let renderer = SqlRenderer::new();
    let mut query = left.sql_select_node().clone();
    query.joins.push(join);
    println!("{}", renderer.render_select(&query));
    Ok(())
}
