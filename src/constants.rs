/// 头部魔数，即 ASCII "ISPC" 按大端解释得到的 32 位值。
/// 与其余头部字段一样，写入载体时采用小端字节序。
pub const POSTCARD_MAGIC: u32 = 0x4953_5043;

/// 隐写头部的固定大小 (字节)：魔数 4 + 保留 2 + 修订号 2 + 附件长度 4。
pub const HEADER_SIZE: usize = 12;

/// 每个像素中用于隐写的通道数 (R, G, B)。
/// Alpha 通道从不参与隐写，因此容量始终按 3 个通道计算。
pub const USED_CHANNELS: usize = 3;

/// 每个字节拆分出的比特数，每个比特占用一个通道字节。
pub const BITS_PER_BYTE: usize = 8;

/// 清除通道字节最低有效位的掩码。
pub const LSB_CLEAR_MASK: u8 = 0xFE;

/// 保留通道字节最低有效位的掩码。
pub const LSB_KEEP_MASK: u8 = 0x01;

/// 向量化写入每批处理的源字节数 (一个 16 位字)。
pub const WRITE_BATCH_BYTES: usize = 2;

/// 向量化写入每批产生的通道比特数。
pub const WRITE_BATCH_LANES: usize = WRITE_BATCH_BYTES * BITS_PER_BYTE;

/// 向量化读取每批还原的字节数。
pub const READ_BATCH_BYTES: usize = 4;

/// 向量化读取每批消耗的通道字节数。
pub const READ_BATCH_LANES: usize = READ_BATCH_BYTES * BITS_PER_BYTE;

/// 向量化路径只处理长度为该值整数倍的前缀，剩余部分交给标量路径。
pub const VECTOR_ALIGNMENT: usize = 4;
