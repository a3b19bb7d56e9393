use anyhow::{bail, Result};
use clap::Parser;
use gf2e_okvs::cli_utils::OkvsArgs;
use gf2e_okvs::okvs::cluster::cluster_params;
use gf2e_okvs::okvs::gct::gct_params;
use gf2e_okvs::okvs::{create_okvs, gen_hash_keys, EncodeOptions, Okvs, OkvsDescriptor, OkvsType};
use gf2e_okvs::set_utils::create_key_value_map;
use log::info;
use scuttlebutt::field::F128b;
use scuttlebutt::AesRng;
use std::time::Instant;

fn main() -> Result<()> {
    pretty_env_logger::init_timed();

    let args = OkvsArgs::parse();

    let okvs_types = if args.all {
        OkvsType::ALL.to_vec()
    } else {
        vec![args.okvs_type]
    };

    for okvs_type in okvs_types {
        print_params(okvs_type, args.n)?;

        if args.verify {
            verify(okvs_type, args.n, args.parallel)?;
        }
    }

    Ok(())
}

fn print_params(okvs_type: OkvsType, n: usize) -> Result<()> {
    let desc = OkvsDescriptor::new::<F128b>(okvs_type, n)?;

    println!("{}", okvs_type);
    println!("  n = {}, l = {}, m = {}", desc.n, desc.l(), desc.m);
    println!("  hash keys = {}, rate = {:.4}", desc.hash_key_num, desc.rate());

    match okvs_type {
        OkvsType::H2NaiveGct | OkvsType::H2BlazeGct | OkvsType::H3NaiveGct => {
            let params = gct_params(okvs_type, n)?;
            println!("  sparse = {}, dense = {}", params.sparse, params.dense);
        }
        OkvsType::H2ClusterBlazeGct | OkvsType::H3ClusterNaiveGct => {
            let params = cluster_params(okvs_type, n)?;
            println!(
                "  bins = {}, bin n = {}, bin sparse = {}, bin dense = {}",
                params.bin_num, params.bin_n, params.bin.sparse, params.bin.dense
            );
        }
        OkvsType::Polynomial | OkvsType::MegaBin => {}
    }

    Ok(())
}

fn verify(okvs_type: OkvsType, n: usize, parallel: bool) -> Result<()> {
    let mut rng = AesRng::new();

    let hash_keys = gen_hash_keys(okvs_type, &mut rng);
    let okvs = create_okvs::<F128b>(okvs_type, n, &hash_keys)?;
    let points = create_key_value_map::<F128b, _>(n, &mut rng)?;

    let start = Instant::now();
    let storage = okvs.encode(&mut rng, &points, EncodeOptions { parallel })?;
    info!("{} encode: {:?}", okvs_type, start.elapsed());

    let start = Instant::now();
    for (key, value) in points.iter() {
        if okvs.decode(&storage, key)? != *value {
            bail!("{} failed to decode a key", okvs_type);
        }
    }
    info!("{} decode: {:?}", okvs_type, start.elapsed());

    println!("  verified {} pairs", points.len());

    Ok(())
}
