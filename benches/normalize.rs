//! Benchmark for flattening large iterator replies
//!
//! Target: a full 1024-record volume page in well under 50ms

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use ontap_facts::facts::catalog::VOLUME;
use ontap_facts::facts::normalize;
use ontap_facts::zapi::parse_results;

fn volume_page(records: usize) -> String {
    let mut body = String::new();
    for i in 0..records {
        body.push_str(&format!(
            "<volume-attributes>\
               <volume-id-attributes>\
                 <name>vol_{i:04}</name>\
                 <owning-vserver-name>svm{}</owning-vserver-name>\
                 <aggr-name>aggr{}</aggr-name>\
                 <junction-path>/vol_{i:04}</junction-path>\
               </volume-id-attributes>\
               <volume-space-attributes>\
                 <size>1073741824</size><size-used>52428800</size-used>\
                 <percentage-snapshot-reserve>5</percentage-snapshot-reserve>\
               </volume-space-attributes>\
               <volume-state-attributes><state>online</state></volume-state-attributes>\
             </volume-attributes>",
            i % 8,
            i % 4,
        ));
    }
    format!(
        "<netapp version=\"1.110\"><results status=\"passed\">\
           <attributes-list>{}</attributes-list><num-records>{}</num-records>\
         </results></netapp>",
        body, records
    )
}

fn bench_parse_and_normalize(c: &mut Criterion) {
    let mut group = c.benchmark_group("normalize");
    group.throughput(Throughput::Elements(1024));

    let xml = volume_page(1024);

    group.bench_function("parse_results_1024_volumes", |b| {
        b.iter(|| parse_results(black_box(&xml)));
    });

    let response = parse_results(&xml).expect("valid page");
    group.bench_function("normalize_1024_volumes", |b| {
        b.iter(|| normalize(black_box(Some(&response)), &VOLUME));
    });

    group.finish();
}

criterion_group!(benches, bench_parse_and_normalize);
criterion_main!(benches);
