/// Returns `true` iff `x` is a (nonzero) power of two.
#[inline]
pub fn is_power_of_two(x: usize) -> bool {
    x != 0 && (x & (x - 1)) == 0
}

/// The smallest power of two that is greater than or equal to `x`. Zero maps to one.
#[inline]
pub fn next_power_of_two(x: usize) -> usize {
    let mut p = 1;
    while p < x {
        p <<= 1;
    }
    p
}

/// Integer square root for exact squares, used to recover the side length of a square raster from its sample count.
#[inline]
pub fn exact_square_side(len: usize) -> Option<usize> {
    let side = (len as f64).sqrt().round() as usize;
    if side * side == len {
        Some(side)
    } else {
        None
    }
}

// ████████╗███████╗███████╗████████╗
// ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝
//    ██║   █████╗  ███████╗   ██║
//    ██║   ██╔══╝  ╚════██║   ██║
//    ██║   ███████╗███████║   ██║
//    ╚═╝   ╚══════╝╚══════╝   ╚═╝
