/// Human readable names of MBR partition type identifiers, indexed by id.
pub const PARTITION_TYPES: [&str; 256] = [
    "Empty", // 0x00
    "DOS 12-bit FAT", // 0x01
    "XENIX root", // 0x02
    "XENIX /usr", // 0x03
    "DOS 3.0+ 16-bit FAT (up to 32M)", // 0x04
    "Extended partition (DOS 3.3+)", // 0x05
    "DOS 3.31+ 16-bit FAT (over 32M)", // 0x06
    "Windows NT NTFS or OS/2 HPFS (IFS)", // 0x07
    "AIX boot (PS/2 port) or OS/2 (v1.0-1.3) or SplitDrive", // 0x08
    "AIX data or Coherent filesystem or QNX 1.x-2.x", // 0x09
    "OS/2 Boot Manager or Coherent swap partition or OPUS", // 0x0A
    "WIN95_OSR2/Win98 FAT32", // 0x0B
    "WIN95_OSR2/Win98 FAT32, LBA-mapped", // 0x0C
    "Unknown or not recognized", // 0x0D
    "WIN95/98: DOS 16-bit FAT, LBA-mapped", // 0x0E
    "Extended partition, LBA-mapped (WIN95/98)", // 0x0F
    "OPUS", // 0x10
    "Hidden DOS 12-bit FAT or Leading Edge DOS 3.x", // 0x11
    "Compaq configuration/diagnostics partition", // 0x12
    "Unknown or not recognized", // 0x13
    "Hidden DOS 16-bit FAT <32M or AST DOS", // 0x14
    "Unknown or not recognized", // 0x15
    "Hidden DOS 16-bit FAT >=32M", // 0x16
    "Hidden NTFS/HPFS(IFS)", // 0x17
    "AST SmartSleep Partition", // 0x18
    "Unknown or not recognized", // 0x19
    "Unknown or not recognized", // 0x1A
    "Hidden WIN95_OSR2/98 FAT32", // 0x1B
    "Hidden WIN95_OSR2/98 FAT32, LBA-mapped", // 0x1C
    "Unknown or not recognized", // 0x1D
    "Hidden WIN95 16-bit FAT, LBA-mapped", // 0x1E
    "Unknown or not recognized", // 0x1F
    "Unknown or not recognized", // 0x20
    "Unknown or not recognized", // 0x21
    "Unknown or not recognized", // 0x22
    "Unknown or not recognized", // 0x23
    "NEC DOS 3.x", // 0x24
    "Unknown or not recognized", // 0x25
    "Unknown or not recognized", // 0x26
    "Unknown or not recognized", // 0x27
    "Unknown or not recognized", // 0x28
    "Unknown or not recognized", // 0x29
    "AtheOS File System (AFS)", // 0x2A
    "SyllableSecure (SylStor)", // 0x2B
    "Unknown or not recognized", // 0x2C
    "Unknown or not recognized", // 0x2D
    "Unknown or not recognized", // 0x2E
    "Unknown or not recognized", // 0x2F
    "Unknown or not recognized", // 0x30
    "Unknown or not recognized", // 0x31
    "NOS", // 0x32
    "Unknown or not recognized", // 0x33
    "Unknown or not recognized", // 0x34
    "JFS on OS/2 or eCS", // 0x35
    "Unknown or not recognized", // 0x36
    "Unknown or not recognized", // 0x37
    "THEOS ver 3.2 2gb partition", // 0x38
    "Plan 9 partition or THEOS ver 4 spanned partition", // 0x39
    "THEOS ver 4 4gb partition", // 0x3A
    "THEOS ver 4 extended partition", // 0x3B
    "PartitionMagic recovery partition", // 0x3C
    "Hidden NetWare", // 0x3D
    "Unknown or not recognized", // 0x3E
    "Unknown or not recognized", // 0x3F
    "Venix 80286", // 0x40
    "Linux/MINIX or PPC PReP Boot", // 0x41
    "Linux swap or SFS or Windows 2000 dynamic ext. partition marker", // 0x42
    "Linux native", // 0x43
    "GoBack partition", // 0x44
    "Boot-US boot manager or Priam or EUMEL/Elan", // 0x45
    "EUMEL/Elan", // 0x46
    "EUMEL/Elan", // 0x47
    "EUMEL/Elan", // 0x48
    "Unknown or not recognized", // 0x49
    "AdaOS Aquila (Withdrawn)", // 0x4A
    "Unknown or not recognized", // 0x4B
    "Oberon partition", // 0x4C
    "QNX4.x", // 0x4D
    "QNX4.x 2nd part", // 0x4E
    "QNX4.x 3rd part or Oberon partition", // 0x4F
    "OnTrack Disk Manager (older versions) RO or Lynx RTOS", // 0x50
    "OnTrack Disk Manager RW (DM6 Aux1) or Novell", // 0x51
    "CP/M or Microport SysV/AT", // 0x52
    "OnTrack Disk Manager 6.0 Aux3", // 0x53
    "OnTrack Disk Manager 6.0 Dynamic Drive Overlay (DDO)", // 0x54
    "EZ-Drive", // 0x55
    "Golden Bow VFeature Partitioned Volume", // 0x56
    "DrivePro or VNDI Partition", // 0x57
    "Unknown or not recognized", // 0x58
    "Unknown or not recognized", // 0x59
    "Unknown or not recognized", // 0x5A
    "Unknown or not recognized", // 0x5B
    "Priam EDisk", // 0x5C
    "Unknown or not recognized", // 0x5D
    "Unknown or not recognized", // 0x5E
    "Unknown or not recognized", // 0x5F
    "Unknown or not recognized", // 0x60
    "SpeedStor", // 0x61
    "Unknown or not recognized", // 0x62
    "Unix System V/386 (SCO, ISC Unix, UnixWare) or Mach or GNU Hurd", // 0x63
    "PC-ARMOUR protected partition or Novell Netware 286, 2.xx", // 0x64
    "Novell Netware 386, 3.xx or 4.xx", // 0x65
    "Novell Netware SMS Partition", // 0x66
    "Novell", // 0x67
    "Novell", // 0x68
    "Novell Netware 5+, Novell Netware NSS Partition", // 0x69
    "Unknown or not recognized", // 0x6A
    "Unknown or not recognized", // 0x6B
    "Unknown or not recognized", // 0x6C
    "Unknown or not recognized", // 0x6D
    "Unknown or not recognized", // 0x6E
    "Unknown or not recognized", // 0x6F
    "DiskSecure Multi-Boot", // 0x70
    "Unknown or not recognized", // 0x71
    "Unknown or not recognized", // 0x72
    "Unknown or not recognized", // 0x73
    "Scramdisk partition", // 0x74
    "IBM PC/IX", // 0x75
    "Unknown or not recognized", // 0x76
    "M2FS/M2CS partition or VNDI Partition", // 0x77
    "XOSL FS", // 0x78
    "Unknown or not recognized", // 0x79
    "Unknown or not recognized", // 0x7A
    "Unknown or not recognized", // 0x7B
    "Unknown or not recognized", // 0x7C
    "Unknown or not recognized", // 0x7D
    "Unknown or not recognized", // 0x7E
    "Unknown or not recognized", // 0x7F
    "Old MINIX (until 1.4a)", // 0x80
    "MINIX since 1.4b, early Linux or Mitac disk manager", // 0x81
    "Linux swap or Prime or Solaris x86", // 0x82
    "Linux native partition", // 0x83
    "OS/2 hidden C: drive or Hibernation partition", // 0x84
    "Linux extended partition", // 0x85
    "Old Linux RAID partition superblock or FAT16 volume set", // 0x86
    "NTFS volume set", // 0x87
    "Linux plaintext partition table", // 0x88
    "Unknown or not recognized", // 0x89
    "Linux Kernel Partition (used by AiR-BOOT)", // 0x8A
    "Legacy Fault Tolerant FAT32 volume", // 0x8B
    "Legacy Fault Tolerant FAT32 volume using BIOS extended INT 13h", // 0x8C
    "Free FDISK hidden Primary DOS FAT12 partition", // 0x8D
    "Linux Logical Volume Manager (LVM) partition", // 0x8E
    "Unknown or not recognized", // 0x8F
    "Free FDISK hidden Primary DOS FAT16 partition", // 0x90
    "Free FDISK hidden DOS extended partition", // 0x91
    "Free FDISK hidden Primary DOS large FAT16 partition", // 0x92
    "Hidden Linux native partition or Amoeba", // 0x93
    "Amoeba bad block table (BBT)", // 0x94
    "MIT EXOPC native partitions", // 0x95
    "Unknown or not recognized", // 0x96
    "Free FDISK hidden Primary DOS FAT32 partition", // 0x97
    "Free FDISK hidden Primary DOS FAT32 partition", // 0x98
    "DCE376 logical drive", // 0x99
    "Free FDISK hidden Primary DOS FAT16 partition (LBA)", // 0x9A
    "Free FDISK hidden DOS extended partition (LBA)", // 0x9B
    "Unknown or not recognized", // 0x9C
    "Unknown or not recognized", // 0x9D
    "Unknown or not recognized", // 0x9E
    "BSD/OS (BSDI)", // 0x9F
    "IBM Thinkpad laptop hibernation partition", // 0xA0
    "Laptop hibernation partition or HP Volume Expansion", // 0xA1
    "Unknown or not recognized", // 0xA2
    "HP Volume Expansion (SpeedStor variant)", // 0xA3
    "HP Volume Expansion (SpeedStor variant)", // 0xA4
    "FreeBSD, NetBSD, BSD/386, 386BSD", // 0xA5
    "OpenBSD or HP Volume Expansion (SpeedStor variant)", // 0xA6
    "NeXTStep", // 0xA7
    "Mac OS-X (Darwin UFS)", // 0xA8
    "NetBSD", // 0xA9
    "Olivetti Fat 12 1.44MB Service Partition", // 0xAA
    "Mac OS-X (Darwin) Boot partition or GO! partition", // 0xAB
    "Unknown or not recognized", // 0xAC
    "Unknown or not recognized", // 0xAD
    "ShagOS filesystem", // 0xAE
    "ShagOS swap partition", // 0xAF
    "BootStar Dummy", // 0xB0
    "HP Volume Expansion (SpeedStor variant)", // 0xB1
    "Unknown or not recognized", // 0xB2
    "HP Volume Expansion (SpeedStor variant)", // 0xB3
    "HP Volume Expansion (SpeedStor variant)", // 0xB4
    "Unknown or not recognized", // 0xB5
    "Corrupted Windows NT mirror set (master), FAT16 file system", // 0xB6
    "BSDI BSD/386 filesystem or Corrupted Win NT mirror set, NTFS", // 0xB7
    "BSDI BSD/386 swap partition", // 0xB8
    "Unknown or not recognized", // 0xB9
    "Unknown or not recognized", // 0xBA
    "Boot Wizard hidden", // 0xBB
    "Unknown or not recognized", // 0xBC
    "Unknown or not recognized", // 0xBD
    "Solaris 8 boot partition", // 0xBE
    "New Solaris x86 partition", // 0xBF
    "CTOS or REAL/32 secure small partition or NTFT Partition", // 0xC0
    "DRDOS/secured (FAT-12)", // 0xC1
    "Hidden Linux", // 0xC2
    "Hidden Linux swap", // 0xC3
    "DRDOS/secured (FAT-16, < 32M)", // 0xC4
    "DRDOS/secured (extended)", // 0xC5
    "DRDOS/secured (FAT-16, >= 32M) or WinNT corrupted FAT16 volume/stripe set", // 0xC6
    "Windows NT corrupted NTFS volume/stripe set or Syrinx boot", // 0xC7
    "Reserved for DR-DOS 8.0+", // 0xC8
    "Reserved for DR-DOS 8.0+", // 0xC9
    "Reserved for DR-DOS 8.0+", // 0xCA
    "DR-DOS 7.04+ secured FAT32 (CHS)", // 0xCB
    "DR-DOS 7.04+ secured FAT32 (LBA)", // 0xCC
    "CTOS Memdump?", // 0xCD
    "DR-DOS 7.04+ FAT16X (LBA)", // 0xCE
    "DR-DOS 7.04+ secured EXT DOS (LBA)", // 0xCF
    "REAL/32 secure big partition or Multiuser DOS secured partition", // 0xD0
    "Old Multiuser DOS secured FAT12", // 0xD1
    "Unknown or not recognized", // 0xD2
    "Unknown or not recognized", // 0xD3
    "Old Multiuser DOS secured FAT16 <32M", // 0xD4
    "Old Multiuser DOS secured extended partition", // 0xD5
    "Old Multiuser DOS secured FAT16 >=32M", // 0xD6
    "Unknown or not recognized", // 0xD7
    "CP/M-86", // 0xD8
    "Unknown or not recognized", // 0xD9
    "Non-FS Data", // 0xDA
    "Digital Research CP/M", // 0xDB
    "Unknown or not recognized", // 0xDC
    "Hidden CTOS Memdump?", // 0xDD
    "Dell PowerEdge Server utilities (FAT fs)", // 0xDE
    "DG/UX virtual disk manager partition or BootIt EMBRM", // 0xDF
    "Reserved by STMicroelectronics for a filesystem called ST AVFS", // 0xE0
    "DOS access or SpeedStor 12-bit FAT extended partition", // 0xE1
    "Unknown or not recognized", // 0xE2
    "DOS R/O or SpeedStor", // 0xE3
    "SpeedStor 16-bit FAT extended partition < 1024 cyl", // 0xE4
    "Tandy MSDOS with logically sectored FAT", // 0xE5
    "Storage Dimensions SpeedStor", // 0xE6
    "Unknown or not recognized", // 0xE7
    "Unknown or not recognized", // 0xE8
    "Unknown or not recognized", // 0xE9
    "Unknown or not recognized", // 0xEA
    "BeOS BFS", // 0xEB
    "SkyOS SkyFS", // 0xEC
    "Unknown or not recognized", // 0xED
    "Intel EFI GUID Partition Table (followed by an EFI header)", // 0xEE
    "Intel EFI (FAT-12/16/32) file system partition", // 0xEF
    "Linux/PA-RISC boot loader", // 0xF0
    "Storage Dimensions SpeedStor", // 0xF1
    "DOS 3.3+ secondary partition", // 0xF2
    "Unknown or not recognized", // 0xF3
    "SpeedStor large partition or Prologue single-volume partition", // 0xF4
    "Prologue multi-volume partition", // 0xF5
    "Storage Dimensions SpeedStor", // 0xF6
    "Unknown or not recognized", // 0xF7
    "Unknown or not recognized", // 0xF8
    "pCache", // 0xF9
    "Bochs", // 0xFA
    "VMware File System partition", // 0xFB
    "VMware Swap partition", // 0xFC
    "Linux raid partition with autodetect", // 0xFD
    "Windows NT Disk Administrator hidden partition or Linux LVM (old)", // 0xFE
    "Xenix Bad Block Table (BBT)", // 0xFF
];

pub const UNKNOWN_TYPE: &str = "Unknown or not recognized";

pub fn describe(type_id: u8) -> &'static str {
    PARTITION_TYPES[type_id as usize]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_well_known_types() {
        assert_eq!(describe(0x00), "Empty");
        assert_eq!(describe(0x07), "Windows NT NTFS or OS/2 HPFS (IFS)");
        assert_eq!(describe(0x83), "Linux native partition");
        assert_eq!(describe(0xFF), "Xenix Bad Block Table (BBT)");
        assert_eq!(describe(0x0D), UNKNOWN_TYPE);
    }
}
