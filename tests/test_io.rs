use ndarray::{arr2, Array2};
use rand::prelude::{Rng, SeedableRng, SmallRng};

use nc4::types::{default_fill, NcType, NcValue};
use nc4::{Error, MemEngine, NcFile};

#[macro_use]
mod common;

use self::common::gen::{gen_shape, gen_slab, gen_vec, Gen};
use self::common::util::new_file;

fn fill_of<T: NcValue>() -> T {
    T::decode(&default_fill(T::NC_TYPE)).unwrap().remove(0)
}

#[test]
pub fn test_fill_past_stored_extent() {
    let (_, mut file) = new_file();
    let root = file.root();
    let t = file.def_unlimited_dim(root, "t").unwrap();
    let long = file.def_var(root, "long", NcType::Int.into(), &[t]).unwrap();
    let short = file.def_var(root, "short", NcType::Int.into(), &[t]).unwrap();
    file.put_vara(root, short, &[0], &[5], &[10, 11, 12, 13, 14]).unwrap();
    file.put_vara(root, long, &[0], &[8], &[0; 8]).unwrap();
    assert_eq!(file.inq_dim(t).unwrap().len, 8);

    let fill = fill_of::<i32>();
    assert_eq!(file.get_vara::<i32>(root, short, &[3], &[5]).unwrap(), vec![13, 14, fill, fill, fill]);
    assert_eq!(file.get_vars::<i32>(root, short, &[1], &[4], Some(&[2])).unwrap(), vec![
        11, 13, fill, fill
    ]);
    assert_eq!(file.get_vara::<i32>(root, short, &[6], &[2]).unwrap(), vec![fill, fill]);
    assert_eq!(file.get_vara(root, short, &[3], &[6]), Err::<Vec<i32>, _>(Error::Edge));
    assert_eq!(file.get_vara(root, short, &[9], &[0]), Err::<Vec<i32>, _>(Error::InvalidCoords));
    assert_eq!(file.get_vara::<i32>(root, short, &[8], &[0]).unwrap(), vec![]);

    // an explicit fill value is synthesized too, converted to the memory type
    let custom = file.def_var(root, "custom", NcType::Short.into(), &[t]).unwrap();
    file.def_var_fill_value(root, custom, -5i16).unwrap();
    file.put_var1(root, custom, &[0], 1i16).unwrap();
    assert_eq!(file.get_vara::<f64>(root, custom, &[0], &[3]).unwrap(), vec![1.0, -5.0, -5.0]);
}

#[test]
pub fn test_extension_monotonic() {
    let (engine, mut file) = new_file();
    let root = file.root();
    let t = file.def_unlimited_dim(root, "t").unwrap();
    let x = file.def_dim(root, "x", 2).unwrap();
    let a = file.def_var(root, "a", NcType::Double.into(), &[t, x]).unwrap();
    let b = file.def_var(root, "b", NcType::Double.into(), &[t]).unwrap();

    file.put_vara(root, a, &[4, 0], &[1, 2], &[1.0, 2.0]).unwrap();
    assert_eq!(file.inq_dim(t).unwrap().len, 5);
    assert_eq!(engine.snapshot("/a").unwrap().extents.dims(), vec![5, 2]);
    file.put_vara(root, a, &[2, 0], &[1, 2], &[3.0, 4.0]).unwrap();
    assert_eq!(file.inq_dim(t).unwrap().len, 5);
    assert_eq!(engine.snapshot("/a").unwrap().extents.dims(), vec![5, 2]);
    assert_eq!(file.var_shape(root, a).unwrap(), vec![5, 2]);

    let fill = fill_of::<f64>();
    assert_eq!(file.get_var::<f64>(root, b).unwrap(), vec![fill; 5]);
    assert_eq!(engine.snapshot("/b").unwrap().extents.dims(), vec![0]);
    file.put_vara(root, a, &[9, 0], &[0, 2], &[0.0; 0]).unwrap();
    assert_eq!(file.inq_dim(t).unwrap().len, 5);
    assert_eq!(engine.snapshot("/a").unwrap().extents.dims(), vec![5, 2]);
    let arr = file.read_array::<f64>(root, a).unwrap();
    assert_eq!(arr.shape(), &[5, 2]);
    assert_eq!(arr[[4, 1]], 2.0);
    assert_eq!(arr[[2, 0]], 3.0);
    assert_eq!(arr[[0, 0]], fill);

    // fixed axes never grow
    assert_eq!(file.put_vara(root, a, &[0, 1], &[1, 2], &[0.0, 0.0]), Err(Error::Edge));
    assert_eq!(file.put_vara(root, a, &[0, 3], &[1, 0], &[0.0; 0]), Err(Error::InvalidCoords));
    file.write_array::<_, f64, _>(root, a, &arr2(&[[9.0, 9.0]; 7])).unwrap();
    assert_eq!(file.inq_dim(t).unwrap().len, 7);
}

#[test]
pub fn test_request_errors() {
    let (_, mut file) = new_file();
    let root = file.root();
    let x = file.def_dim(root, "x", 4).unwrap();
    let v = file.def_var(root, "v", NcType::Int.into(), &[x]).unwrap();
    let c = file.def_var(root, "c", NcType::Char.into(), &[x]).unwrap();

    assert_eq!(file.put_vars(root, v, &[0], &[2], Some(&[0]), &[1, 2]), Err(Error::Stride));
    assert_eq!(file.get_vars::<i32>(root, v, &[0], &[2], Some(&[-1])), Err(Error::Stride));
    assert_err!(file.put_vara(root, v, &[0, 0], &[1, 1], &[1]), "invalid argument");
    assert_err!(file.put_vara(root, v, &[0], &[2], &[1, 2, 3]), "invalid argument");
    assert_eq!(file.put_vars(root, v, &[1], &[2], Some(&[3]), &[1, 2]), Err(Error::Edge));
    assert_eq!(file.put_vara(root, v, &[5], &[0], &[0i32; 0]), Err(Error::InvalidCoords));
    file.put_vara(root, v, &[4], &[0], &[0i32; 0]).unwrap();

    assert_eq!(file.put_var(root, c, &[1, 2, 3, 4]), Err(Error::Char));
    assert_eq!(file.put_vara_text(root, v, &[0], &[2], b"ab"), Err(Error::Char));
    file.put_vara_text(root, c, &[0], &[4], b"abcd").unwrap();
    assert_eq!(file.get_vara_text(root, c, &[1], &[2]).unwrap(), b"bc".to_vec());
}

fn check_random_slabs<T>(rng: &mut SmallRng, file: &mut NcFile, shape: &[usize])
where
    T: NcValue + Gen + PartialEq,
{
    let root = file.root();
    let base = file.inq_dimids(root).unwrap().len();
    let dims = shape
        .iter()
        .enumerate()
        .map(|(i, &len)| file.def_dim(root, &format!("d{}", base + i), len).unwrap())
        .collect::<Vec<_>>();
    let name = format!("v{}", file.inq_varids(root).unwrap().len());
    let v = file.def_var(root, &name, T::NC_TYPE.into(), &dims).unwrap();

    let total = shape.iter().product();
    let mut model: Vec<T> = gen_vec(rng, total);
    file.put_var(root, v, &model).unwrap();

    for _ in 0..20 {
        let slab = gen_slab(rng, shape);
        let positions = slab.positions(shape);
        let got = file.get_vars::<T>(root, v, &slab.start, &slab.count, Some(&slab.stride[..])).unwrap();
        let expected = positions.iter().map(|&p| model[p].clone()).collect::<Vec<_>>();
        assert!(got == expected, "read mismatch for {:?} in {:?}", slab, shape);

        let slab = gen_slab(rng, shape);
        let values: Vec<T> = gen_vec(rng, slab.len());
        file.put_vars(root, v, &slab.start, &slab.count, Some(&slab.stride[..]), &values).unwrap();
        for (&p, value) in slab.positions(shape).iter().zip(values) {
            model[p] = value;
        }
    }
    assert!(file.get_var::<T>(root, v).unwrap() == model, "final mismatch in {:?}", shape);
}

#[test]
pub fn test_random_hyperslabs() {
    let mut rng = SmallRng::seed_from_u64(7);
    let (_, mut file) = new_file();
    for ndim in 1..=4 {
        for _ in 0..5 {
            let shape = gen_shape(&mut rng, ndim);
            check_random_slabs::<f64>(&mut rng, &mut file, &shape);
            check_random_slabs::<i16>(&mut rng, &mut file, &shape);
            check_random_slabs::<u8>(&mut rng, &mut file, &shape);
        }
    }
}

macro_rules! test_round_trip {
    ($($ty:ident),*) => {
        paste::paste! {
            $(
                #[test]
                pub fn [<test_round_trip_ $ty>]() {
                    let mut rng = SmallRng::seed_from_u64(3);
                    let (_, mut file) = new_file();
                    let root = file.root();
                    let x = file.def_dim(root, "x", 64).unwrap();
                    let v = file.def_var(root, "v", <$ty>::NC_TYPE.into(), &[x]).unwrap();
                    let values: Vec<$ty> = gen_vec(&mut rng, 64);
                    file.put_var(root, v, &values).unwrap();
                    let back = file.get_var::<$ty>(root, v).unwrap();
                    let same = values.iter().zip(&back).all(|(a, b)| a.to_ne_bytes() == b.to_ne_bytes());
                    assert!(same);
                }
            )*
        }
    };
}

test_round_trip!(i8, i16, i32, i64, u8, u16, u32, u64, f32, f64);

#[test]
pub fn test_narrow_memory_type() {
    let mut rng = SmallRng::seed_from_u64(11);
    let (_, mut file) = new_file();
    let root = file.root();
    let x = file.def_dim(root, "x", 16).unwrap();
    let v = file.def_var(root, "v", NcType::Int.into(), &[x]).unwrap();

    for _ in 0..50 {
        let wide = (0..16)
            .map(|_| if rng.gen_bool(0.1) { rng.gen_range(-1000..1000) } else { rng.gen_range(-128..128) })
            .collect::<Vec<i32>>();
        let fits = wide.iter().all(|&w| i8::try_from(w).is_ok());
        file.put_var(root, v, &wide).unwrap();

        let mut narrow = vec![];
        let res = file.get_vars_into::<i8>(root, v, &[0], &[16], None, &mut narrow);
        assert_eq!(res, if fits { Ok(()) } else { Err(Error::Range) });
        assert_eq!(narrow, wide.iter().map(|&w| w as i8).collect::<Vec<_>>());

        // writing the narrow values back is always in range
        file.put_var(root, v, &narrow).unwrap();
        let back = file.get_var::<i8>(root, v).unwrap();
        assert_eq!(back, narrow);
    }

    let res = file.put_var(root, v, &[3_000_000_000u32; 16]);
    assert_eq!(res, Err(Error::Range));
    assert_eq!(file.get_var::<i64>(root, v).unwrap(), vec![3_000_000_000u32 as i32 as i64; 16]);
}

#[test]
pub fn test_classic_byte_range() {
    let values = [-3i16, 200, 255, 12];
    for &classic in &[false, true] {
        let mut file = NcFile::with_options().classic_model(classic).create(MemEngine::new()).unwrap();
        let root = file.root();
        let x = file.def_dim(root, "x", 4).unwrap();
        let b = file.def_var(root, "b", NcType::Byte.into(), &[x]).unwrap();
        file.enddef().unwrap();

        let bytes = values.iter().map(|&v| v as u8).collect::<Vec<_>>();
        let res = file.put_var(root, b, &bytes);
        assert_eq!(res, if classic { Ok(()) } else { Err(Error::Range) });
        let mut back = vec![];
        let res = file.get_vars_into::<u8>(root, b, &[0], &[4], None, &mut back);
        assert_eq!(res, if classic { Ok(()) } else { Err(Error::Range) });
        assert_eq!(back, bytes);

        // other narrowing conversions are reported either way
        assert_eq!(file.put_var(root, b, &values), Err(Error::Range));
    }
}

#[test]
pub fn test_array_io() {
    let (_, mut file) = new_file();
    let root = file.root();
    let y = file.def_dim(root, "y", 2).unwrap();
    let x = file.def_dim(root, "x", 3).unwrap();
    let v = file.def_var(root, "v", NcType::Float.into(), &[y, x]).unwrap();
    let arr = arr2(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]);
    file.write_array::<_, f32, _>(root, v, arr.t().to_owned().t()).unwrap();
    let back: Array2<f32> = file.read_array(root, v).unwrap().into_dimensionality().unwrap();
    assert_eq!(back, arr);
    assert_err!(file.write_array::<_, f32, _>(root, v, &[1.0f32][..]), "ndim mismatch");
}
